//! Proposals — the subjects under governance vote.

use concord_types::{NodeClass, SubjectId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GovernanceError;

/// What kind of admission request a vote decides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// A new node applying to join the network.
    NodeJoin,
    /// A registered node requesting orderly exit.
    NodeExit,
    /// A slashing motion against a misbehaving node.
    NodeSlash,
    /// A secondary-chain application requesting registration.
    L2Register,
    /// A motion to suspend a registered secondary chain.
    L2Suspend,
}

impl SubjectKind {
    /// The elector classes entitled to vote on this kind of proposal.
    ///
    /// Every current kind puts both classes on the hook; the mapping is
    /// explicit so a future kind can restrict its electorate without
    /// touching the casting precondition.
    pub fn eligible_classes(&self) -> &'static [NodeClass] {
        match self {
            Self::NodeJoin
            | Self::NodeExit
            | Self::NodeSlash
            | Self::L2Register
            | Self::L2Suspend => &[NodeClass::Validator, NodeClass::FullNode],
        }
    }

    /// Whether nodes of `class` may vote on this kind of proposal.
    pub fn is_class_eligible(&self, class: NodeClass) -> bool {
        self.eligible_classes().contains(&class)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NodeJoin => "node join",
            Self::NodeExit => "node exit",
            Self::NodeSlash => "node slash",
            Self::L2Register => "L2 register",
            Self::L2Suspend => "L2 suspend",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for SubjectKind {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node_join" => Ok(Self::NodeJoin),
            "node_exit" => Ok(Self::NodeExit),
            "node_slash" => Ok(Self::NodeSlash),
            "l2_register" => Ok(Self::L2Register),
            "l2_suspend" => Ok(Self::L2Suspend),
            other => Err(GovernanceError::UnknownSubjectKind(other.to_string())),
        }
    }
}

/// The subject of one governance vote.
///
/// Created externally when an application is submitted; this core reads it,
/// never mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    /// Opaque identifier of the applying node or secondary chain.
    pub subject_id: SubjectId,
    /// What is being requested.
    pub kind: SubjectKind,
    /// Human-readable description shown alongside the vote, when provided.
    #[serde(default)]
    pub description: Option<String>,
}
