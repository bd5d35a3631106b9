//! Decisions — one elector's immutable choice on one vote.

use concord_types::{AccountAddress, NodeId, Timestamp, VoteId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The choice an elector casts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionChoice {
    Approve,
    Reject,
}

impl DecisionChoice {
    /// The wire spelling of this choice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for DecisionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One elector's recorded choice on one vote.
///
/// At most one exists per `(vote_id, node_id)` pair; the tally service
/// rejects a second submission rather than merging it. Created once,
/// never updated or deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Decision {
    pub vote_id: VoteId,
    pub node_id: NodeId,
    pub choice: DecisionChoice,
    pub decided_at: Timestamp,
    /// The funding account whose credential authorized this decision.
    pub backing_account: AccountAddress,
}
