//! Service traits over the gateway's wire contract.
//!
//! The exact schema is owned by the gateway; these traits pin down the
//! semantics the client depends on. [`crate::GatewayClient`] implements
//! them over HTTP and `concord-nullables` provides deterministic in-memory
//! implementations for tests.

use concord_governance::{DecisionChoice, VoteTally};
use concord_types::{AccountAddress, NodeId, OperatorId, VoteId};

use crate::error::{CastError, ClientError};
use crate::query::VoteSummary;

/// One decision submission, fully resolved and authorized.
///
/// No `Debug` impl: the secret must never reach a log line.
pub struct DecisionRequest<'a> {
    pub vote_id: &'a VoteId,
    pub node_id: &'a NodeId,
    pub choice: DecisionChoice,
    pub backing_account: &'a AccountAddress,
    pub secret: &'a str,
}

/// The authoritative tally service.
#[allow(async_fn_in_trait)]
pub trait TallyService {
    /// Open proposals with minimal identifying fields and whether `operator`
    /// has already decided each. Counters are intentionally omitted to keep
    /// listing cheap; fetch them per vote via [`Self::get_tally`].
    async fn list_open_votes(
        &self,
        operator: &OperatorId,
    ) -> Result<Vec<VoteSummary>, ClientError>;

    /// The full counters for one vote.
    async fn get_tally(&self, vote_id: &VoteId) -> Result<VoteTally, ClientError>;

    /// Submit one decision. Acceptance durably records it server-side;
    /// rejection reports the distinct [`CastError`] kind.
    async fn submit_decision(&self, request: DecisionRequest<'_>) -> Result<(), CastError>;

    /// Whether a decision by `node_id` on `vote_id` has been durably
    /// recorded. Used to reconcile after a transport fault.
    async fn decision_exists(
        &self,
        vote_id: &VoteId,
        node_id: &NodeId,
    ) -> Result<bool, ClientError>;
}

/// The account/ledger collaborator, read side only: balances are refetched
/// after every accepted cast because a fee may have been charged.
#[allow(async_fn_in_trait)]
pub trait LedgerService {
    async fn account_balance(&self, address: &AccountAddress) -> Result<u128, ClientError>;
}

// Shared references delegate, so one service instance can back the casting
// protocol, the query service, and the directory at the same time.

impl<S: TallyService> TallyService for &S {
    async fn list_open_votes(
        &self,
        operator: &OperatorId,
    ) -> Result<Vec<VoteSummary>, ClientError> {
        (**self).list_open_votes(operator).await
    }

    async fn get_tally(&self, vote_id: &VoteId) -> Result<VoteTally, ClientError> {
        (**self).get_tally(vote_id).await
    }

    async fn submit_decision(&self, request: DecisionRequest<'_>) -> Result<(), CastError> {
        (**self).submit_decision(request).await
    }

    async fn decision_exists(
        &self,
        vote_id: &VoteId,
        node_id: &NodeId,
    ) -> Result<bool, ClientError> {
        (**self).decision_exists(vote_id, node_id).await
    }
}

impl<L: LedgerService> LedgerService for &L {
    async fn account_balance(&self, address: &AccountAddress) -> Result<u128, ClientError> {
        (**self).account_balance(address).await
    }
}
