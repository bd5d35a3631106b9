//! Errors for malformed values arriving from the gateway.

use thiserror::Error;

/// Validation errors for the fundamental types.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("unknown node class: {0}")]
    UnknownNodeClass(String),

    #[error("unknown node status: {0}")]
    UnknownNodeStatus(String),
}
