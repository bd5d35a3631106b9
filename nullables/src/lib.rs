//! Nullable infrastructure for deterministic testing.
//!
//! The governance client's external collaborators (elector directory,
//! authoritative tally service, ledger) are abstracted behind traits. This
//! crate provides in-memory implementations that:
//! - Enforce the same semantics the real gateway does (one decision per
//!   elector, window expiry, credential checks, vote fees)
//! - Are controlled programmatically (set the clock, close a vote, drop a
//!   response)
//! - Never touch the network
//!
//! Usage: swap the gateway for nullables in tests.

pub mod directory;
pub mod tally;

pub use directory::NullDirectory;
pub use tally::{NullTallyService, SubmitFailure};
