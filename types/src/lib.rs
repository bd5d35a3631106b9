//! Fundamental types for the Concord governance client.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: opaque identifiers, account addresses, timestamps, and the
//! node classification enums the governance rules are written against.

pub mod account;
pub mod error;
pub mod id;
pub mod node;
pub mod time;

pub use account::AccountAddress;
pub use error::TypeError;
pub use id::{NodeId, OperatorId, SubjectId, VoteId};
pub use node::{NodeClass, NodeStatus};
pub use time::Timestamp;
