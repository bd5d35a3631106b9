//! Governance vote model for the Concord network.
//!
//! A proposal (node admission, exit, slash; L2 register or suspend) gets
//! exactly one vote round. Validators and full nodes tally separately and
//! each class must reach its own threshold server-side; this crate models
//! the tally as observed by a client and owns the pure math around it:
//! progress percentages, the voting-window countdown, and the counter
//! invariants checked when a tally arrives over the wire.
//!
//! Key principle: `status` is authoritative. The client never judges
//! approval locally; quorum policy lives in the tally service.

pub mod decision;
pub mod error;
pub mod proposal;
pub mod tally;
pub mod window;

pub use decision::{Decision, DecisionChoice};
pub use error::GovernanceError;
pub use proposal::{Proposal, SubjectKind};
pub use tally::{progress, ClassCounts, VoteStatus, VoteTally};
pub use window::{time_remaining, TimeRemaining, DEFAULT_VOTING_WINDOW_SECS};
