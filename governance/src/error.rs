use thiserror::Error;

use concord_types::{NodeClass, Timestamp};

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("{class} decisions exceed electorate: {decided} > {total}")]
    CounterOverflow {
        class: NodeClass,
        decided: u32,
        total: u32,
    },

    #[error("voting window is inverted: expires {expires_at} before submission {submitted_at}")]
    InvalidWindow {
        submitted_at: Timestamp,
        expires_at: Timestamp,
    },

    #[error("unknown subject kind: {0}")]
    UnknownSubjectKind(String),

    #[error("unknown vote status: {0}")]
    UnknownVoteStatus(String),
}
