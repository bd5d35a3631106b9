//! Node classification enums for the two elector classes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// The elector class of a network node.
///
/// Each class tallies separately: a vote needs both the validator electorate
/// and the full-node electorate to reach their thresholds server-side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    /// Block-producing node with staked weight.
    Validator,
    /// Non-producing node that replicates and verifies the ledger.
    FullNode,
}

impl NodeClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validator => "validator",
            Self::FullNode => "full node",
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for NodeClass {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validator" => Ok(Self::Validator),
            "full_node" | "fullnode" => Ok(Self::FullNode),
            other => Err(TypeError::UnknownNodeClass(other.to_string())),
        }
    }
}

/// The registration status of a network node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Admission approved but the node has not come online yet.
    Pending,
    /// Registered and participating.
    Active,
    /// Registered but currently offline or suspended.
    Inactive,
    /// Permanently exited the network.
    Retired,
}

impl NodeStatus {
    /// Whether a node in this status may cast governance votes.
    ///
    /// Votes already cast by a node that later went inactive remain counted;
    /// this only gates new casts.
    pub fn can_vote(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl FromStr for NodeStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "inactive" | "suspended" => Ok(Self::Inactive),
            "retired" => Ok(Self::Retired),
            other => Err(TypeError::UnknownNodeStatus(other.to_string())),
        }
    }
}
