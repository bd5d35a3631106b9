//! Elector identity and backing-account records.

use concord_types::{AccountAddress, NodeClass, NodeId, NodeStatus, OperatorId};
use serde::{Deserialize, Serialize};

/// One network node identity entitled to vote.
///
/// Owned by the operator who registered it; this crate looks identities up
/// and never mutates them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectorIdentity {
    pub node_id: NodeId,
    pub node_class: NodeClass,
    pub status: NodeStatus,
    /// The funding account whose credentials authorize this node's votes.
    pub backing_account: AccountAddress,
    /// The operator who registered this node.
    pub owner: OperatorId,
    /// Display name shown in the dashboard, when the operator set one.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl ElectorIdentity {
    /// Whether this identity may cast a new vote right now.
    pub fn may_cast(&self) -> bool {
        self.status.can_vote()
    }
}

/// A resolved backing account: the funding identity behind an elector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    pub address: AccountAddress,
    /// Current spendable balance in raw ledger units (a vote may be charged
    /// a fee against this).
    pub balance: u128,
}
