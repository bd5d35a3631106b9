//! Elector registry for the Concord governance client.
//!
//! Resolves which node identities an authenticated operator controls and
//! which funding account backs each identity's voting stake. Pure lookup
//! over an [`ElectorDirectory`] data source; nothing here mutates anything.

pub mod elector;
pub mod error;
pub mod registry;

pub use elector::{AccountRef, ElectorIdentity};
pub use error::RegistryError;
pub use registry::{ElectorDirectory, ElectorRegistry};
