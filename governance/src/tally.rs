//! Vote tallies — per-class counters and the observed decision rule.
//!
//! The tally service owns the quorum policy and assigns `status`; a client
//! only reproduces what is displayable from the counters. Nothing in this
//! module mutates a tally.

use concord_types::{NodeClass, Timestamp, VoteId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::GovernanceError;

/// The lifecycle status of a vote, as assigned by the tally service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteStatus {
    /// Voting window open, thresholds not yet reached.
    Pending,
    /// Both elector classes reached their approval threshold.
    Approved,
    /// The rejection threshold was reached in at least one class.
    Rejected,
    /// The window elapsed without a decision.
    Expired,
}

impl VoteStatus {
    /// Whether this status ends the vote. Only `Pending` is non-terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for VoteStatus {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" | "open" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            other => Err(GovernanceError::UnknownVoteStatus(other.to_string())),
        }
    }
}

/// Approval percentage for a class: `round(100 * approve / total)`.
///
/// Total-order-stable and pure; `0` when the electorate is empty, clamped to
/// 100 for out-of-range counter data so display code never sees >100%.
pub fn progress(approve: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u64::from(approve) * 200 + u64::from(total)) / (u64::from(total) * 2);
    pct.min(100) as u8
}

/// The counters of one elector class within a tally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassCounts {
    pub approve: u32,
    pub reject: u32,
    pub total: u32,
}

impl ClassCounts {
    /// How many electors of this class have decided.
    pub fn decided(&self) -> u32 {
        self.approve.saturating_add(self.reject)
    }

    /// Approval percentage against the snapshotted electorate size.
    pub fn approval_progress(&self) -> u8 {
        progress(self.approve, self.total)
    }
}

/// The aggregate record of decisions for one proposal.
///
/// Electorate sizes are snapshotted at vote creation; later membership
/// changes never move a vote's denominator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteTally {
    pub vote_id: VoteId,
    pub status: VoteStatus,
    pub submitted_at: Timestamp,
    pub expires_at: Timestamp,
    pub validator_approve: u32,
    pub validator_reject: u32,
    pub fullnode_approve: u32,
    pub fullnode_reject: u32,
    pub total_validators: u32,
    pub total_fullnodes: u32,
}

impl VoteTally {
    /// The counters for one elector class.
    pub fn class_counts(&self, class: NodeClass) -> ClassCounts {
        match class {
            NodeClass::Validator => ClassCounts {
                approve: self.validator_approve,
                reject: self.validator_reject,
                total: self.total_validators,
            },
            NodeClass::FullNode => ClassCounts {
                approve: self.fullnode_approve,
                reject: self.fullnode_reject,
                total: self.total_fullnodes,
            },
        }
    }

    pub fn validator_progress(&self) -> u8 {
        self.class_counts(NodeClass::Validator).approval_progress()
    }

    pub fn fullnode_progress(&self) -> u8 {
        self.class_counts(NodeClass::FullNode).approval_progress()
    }

    /// Validate the per-class `decided <= total` invariant and the window
    /// ordering. Run on every tally crossing the transport boundary; a
    /// violation means corrupt gateway data, not a displayable tally.
    pub fn check_counters(&self) -> Result<(), GovernanceError> {
        for class in [NodeClass::Validator, NodeClass::FullNode] {
            let counts = self.class_counts(class);
            if counts.decided() > counts.total {
                return Err(GovernanceError::CounterOverflow {
                    class,
                    decided: counts.decided(),
                    total: counts.total,
                });
            }
        }
        if self.expires_at < self.submitted_at {
            return Err(GovernanceError::InvalidWindow {
                submitted_at: self.submitted_at,
                expires_at: self.expires_at,
            });
        }
        Ok(())
    }

    /// Whether a decision may still be cast: status pending and window open.
    pub fn is_open(&self, now: Timestamp) -> bool {
        self.status == VoteStatus::Pending && now < self.expires_at
    }

    /// The status to display at `now`.
    ///
    /// A vote still marked `Pending` past its window renders as `Expired`
    /// without mutating the record; everything else is the server's word,
    /// verbatim. This is the whole of the client-side decision rule.
    pub fn effective_status(&self, now: Timestamp) -> VoteStatus {
        if self.status == VoteStatus::Pending && now >= self.expires_at {
            VoteStatus::Expired
        } else {
            self.status
        }
    }
}
