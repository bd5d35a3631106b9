use thiserror::Error;

use concord_governance::GovernanceError;
use concord_registry::RegistryError;
use concord_types::NodeId;

/// Transport and data errors from talking to the gateway.
///
/// Read-side occurrences are always retryable and must never clear
/// previously displayed state.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("governance data error: {0}")]
    Data(#[from] GovernanceError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Why a vote cast could not proceed or was refused.
///
/// Every kind is preserved distinctly end to end; the caller's retry or
/// abandon choice depends on which one occurred.
#[derive(Debug, Error)]
pub enum CastError {
    /// The operator controls no active identity of a class this vote
    /// accepts. Correctable only by acquiring or activating an identity.
    #[error("operator controls no active identity eligible for this vote")]
    NoEligibleIdentity,

    /// The selected identity belongs to a different operator.
    #[error("node {0} is not controlled by the current operator")]
    NotControlled(NodeId),

    /// The gateway rejected the credential. Retryable with a corrected
    /// secret; identity selection is retained.
    #[error("credential rejected by the gateway")]
    Unauthorized,

    /// This identity has already decided this vote. Terminal.
    #[error("node {0} has already decided this vote")]
    DuplicateDecision(NodeId),

    /// The vote is no longer pending or its window has passed. Terminal.
    #[error("vote is no longer open")]
    VoteClosed,

    /// The identity is not active. Re-checkable after external reactivation.
    #[error("node {0} is not active")]
    IneligibleIdentity(NodeId),

    /// The secret failed the local shape pre-check; nothing was sent.
    #[error("secret must be {expected} hex characters, got {got}")]
    MalformedSecret { expected: usize, got: usize },

    /// The protocol is not in a state that allows this call.
    #[error("cannot {action} in the {state} state")]
    NotReady {
        action: &'static str,
        state: &'static str,
    },

    /// A prior submission's outcome is unknown; reconcile before retrying.
    #[error("submission outcome unknown, reconciliation required")]
    NeedsReconcile,

    #[error(transparent)]
    Client(#[from] ClientError),
}
