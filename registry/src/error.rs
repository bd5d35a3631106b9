use thiserror::Error;

use concord_types::NodeId;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The identity's backing account is missing from the ledger. This is a
    /// data-integrity fault, surfaced verbatim and never retried.
    #[error("no backing account found for node {0}")]
    UnresolvedBackingAccount(NodeId),

    #[error("directory lookup failed: {0}")]
    Directory(String),
}
