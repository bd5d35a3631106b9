//! Nullable tally service — the authoritative vote semantics, in memory.
//!
//! Enforces what the real tally service enforces: window expiry, credential
//! checks against the backing account, one decision per elector, counter
//! increments, and the vote fee. Tests drive the clock and inject transport
//! failures to exercise the client's reconciliation paths.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use concord_client::{
    CastError, ClientError, DecisionRequest, LedgerService, TallyService, VoteSummary,
};
use concord_governance::{Decision, DecisionChoice, Proposal, VoteStatus, VoteTally};
use concord_registry::ElectorIdentity;
use concord_types::{AccountAddress, NodeClass, NodeId, NodeStatus, OperatorId, Timestamp, VoteId};

/// How a queued submit failure behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitFailure {
    /// The decision is durably recorded, then the response is dropped:
    /// the "delayed original landed" half of a transport timeout.
    RecordThenDrop,
    /// The request never reaches the tally; nothing is recorded.
    DropBeforeRecord,
}

struct VoteEntry {
    proposal: Proposal,
    tally: VoteTally,
}

struct Inner {
    now: u64,
    fee: u128,
    order: Vec<VoteId>,
    votes: HashMap<VoteId, VoteEntry>,
    identities: HashMap<NodeId, ElectorIdentity>,
    secrets: HashMap<AccountAddress, String>,
    balances: HashMap<AccountAddress, u128>,
    decisions: HashMap<(VoteId, NodeId), Decision>,
    voted_at: HashMap<(VoteId, OperatorId), u64>,
    queued_submit_failure: Option<SubmitFailure>,
    failing_tallies: HashSet<VoteId>,
}

/// A deterministic in-memory tally authority.
pub struct NullTallyService {
    inner: Mutex<Inner>,
}

impl NullTallyService {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                now: 1_000_000,
                fee: 0,
                order: Vec::new(),
                votes: HashMap::new(),
                identities: HashMap::new(),
                secrets: HashMap::new(),
                balances: HashMap::new(),
                decisions: HashMap::new(),
                voted_at: HashMap::new(),
                queued_submit_failure: None,
                failing_tallies: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("null tally lock poisoned")
    }

    // ── Builders ────────────────────────────────────────────────────────

    pub fn with_now(self, secs: u64) -> Self {
        self.lock().now = secs;
        self
    }

    /// The fee debited from the backing account per accepted decision.
    pub fn with_fee(self, fee: u128) -> Self {
        self.lock().fee = fee;
        self
    }

    pub fn with_vote(self, proposal: Proposal, tally: VoteTally) -> Self {
        {
            let mut inner = self.lock();
            inner.order.push(tally.vote_id.clone());
            inner
                .votes
                .insert(tally.vote_id.clone(), VoteEntry { proposal, tally });
        }
        self
    }

    pub fn with_identity(self, identity: ElectorIdentity) -> Self {
        self.lock()
            .identities
            .insert(identity.node_id.clone(), identity);
        self
    }

    /// Register a funded account and the secret that authorizes it.
    pub fn with_account(self, address: AccountAddress, balance: u128, secret: &str) -> Self {
        {
            let mut inner = self.lock();
            inner.balances.insert(address.clone(), balance);
            inner.secrets.insert(address, secret.to_string());
        }
        self
    }

    // ── Test controls ───────────────────────────────────────────────────

    pub fn set_now(&self, secs: u64) {
        self.lock().now = secs;
    }

    /// Server-side status transition (the quorum rule this client never
    /// reproduces).
    pub fn set_status(&self, vote_id: &VoteId, status: VoteStatus) {
        if let Some(entry) = self.lock().votes.get_mut(vote_id) {
            entry.tally.status = status;
        }
    }

    pub fn set_identity_status(&self, node_id: &NodeId, status: NodeStatus) {
        if let Some(identity) = self.lock().identities.get_mut(node_id) {
            identity.status = status;
        }
    }

    /// Make the next `submit_decision` fail at the transport layer.
    pub fn queue_submit_failure(&self, failure: SubmitFailure) {
        self.lock().queued_submit_failure = Some(failure);
    }

    /// Make the next `get_tally` for `vote_id` fail at the transport layer.
    pub fn fail_next_tally(&self, vote_id: &VoteId) {
        self.lock().failing_tallies.insert(vote_id.clone());
    }

    // ── Assertion helpers ───────────────────────────────────────────────

    pub fn decision_count(&self, vote_id: &VoteId) -> usize {
        self.lock()
            .decisions
            .keys()
            .filter(|(vote, _)| vote == vote_id)
            .count()
    }

    pub fn balance_of(&self, address: &AccountAddress) -> Option<u128> {
        self.lock().balances.get(address).copied()
    }

    pub fn tally_snapshot(&self, vote_id: &VoteId) -> Option<VoteTally> {
        self.lock().votes.get(vote_id).map(|entry| entry.tally.clone())
    }

    /// The recorded decision for one elector on one vote, if any.
    pub fn decision(&self, vote_id: &VoteId, node_id: &NodeId) -> Option<Decision> {
        self.lock()
            .decisions
            .get(&(vote_id.clone(), node_id.clone()))
            .cloned()
    }
}

impl Default for NullTallyService {
    fn default() -> Self {
        Self::new()
    }
}

fn try_record(inner: &mut Inner, request: &DecisionRequest<'_>) -> Result<(), CastError> {
    let now = inner.now;
    let fee = inner.fee;

    let entry = inner
        .votes
        .get(request.vote_id)
        .ok_or_else(|| ClientError::Gateway(format!("unknown vote {}", request.vote_id)))?;
    if entry.tally.status != VoteStatus::Pending || now >= entry.tally.expires_at.as_secs() {
        return Err(CastError::VoteClosed);
    }

    let identity = inner
        .identities
        .get(request.node_id)
        .ok_or_else(|| ClientError::Gateway(format!("unknown node {}", request.node_id)))?;
    if !identity.status.can_vote() || !entry.proposal.kind.is_class_eligible(identity.node_class) {
        return Err(CastError::IneligibleIdentity(request.node_id.clone()));
    }
    // the backing account must be the one registered for this node, and the
    // secret must match that account's credential
    if identity.backing_account != *request.backing_account {
        return Err(CastError::Unauthorized);
    }
    match inner.secrets.get(request.backing_account) {
        Some(secret) if secret == request.secret => {}
        _ => return Err(CastError::Unauthorized),
    }

    let key = (request.vote_id.clone(), request.node_id.clone());
    if inner.decisions.contains_key(&key) {
        return Err(CastError::DuplicateDecision(request.node_id.clone()));
    }

    let class = identity.node_class;
    let owner = identity.owner.clone();
    inner.decisions.insert(
        key,
        Decision {
            vote_id: request.vote_id.clone(),
            node_id: request.node_id.clone(),
            choice: request.choice,
            decided_at: Timestamp::new(now),
            backing_account: request.backing_account.clone(),
        },
    );
    let entry = inner
        .votes
        .get_mut(request.vote_id)
        .ok_or_else(|| ClientError::Gateway("vote vanished".into()))?;
    match (class, request.choice) {
        (NodeClass::Validator, DecisionChoice::Approve) => entry.tally.validator_approve += 1,
        (NodeClass::Validator, DecisionChoice::Reject) => entry.tally.validator_reject += 1,
        (NodeClass::FullNode, DecisionChoice::Approve) => entry.tally.fullnode_approve += 1,
        (NodeClass::FullNode, DecisionChoice::Reject) => entry.tally.fullnode_reject += 1,
    }
    if let Some(balance) = inner.balances.get_mut(request.backing_account) {
        *balance = balance.saturating_sub(fee);
    }
    inner
        .voted_at
        .insert((request.vote_id.clone(), owner), now);
    Ok(())
}

impl TallyService for NullTallyService {
    async fn list_open_votes(
        &self,
        operator: &OperatorId,
    ) -> Result<Vec<VoteSummary>, ClientError> {
        let inner = self.lock();
        Ok(inner
            .order
            .iter()
            .filter_map(|vote_id| inner.votes.get(vote_id))
            .filter(|entry| entry.tally.status == VoteStatus::Pending)
            .map(|entry| VoteSummary {
                vote_id: entry.tally.vote_id.clone(),
                subject_id: entry.proposal.subject_id.clone(),
                kind: entry.proposal.kind,
                description: entry.proposal.description.clone(),
                submitted_at: entry.tally.submitted_at,
                expires_at: entry.tally.expires_at,
                voted_at: inner
                    .voted_at
                    .get(&(entry.tally.vote_id.clone(), operator.clone()))
                    .map(|secs| Timestamp::new(*secs)),
            })
            .collect())
    }

    async fn get_tally(&self, vote_id: &VoteId) -> Result<VoteTally, ClientError> {
        let mut inner = self.lock();
        if inner.failing_tallies.remove(vote_id) {
            return Err(ClientError::Transport("simulated tally fetch failure".into()));
        }
        inner
            .votes
            .get(vote_id)
            .map(|entry| entry.tally.clone())
            .ok_or_else(|| ClientError::Gateway(format!("unknown vote {vote_id}")))
    }

    async fn submit_decision(&self, request: DecisionRequest<'_>) -> Result<(), CastError> {
        let mut inner = self.lock();
        match inner.queued_submit_failure.take() {
            Some(SubmitFailure::RecordThenDrop) => {
                let _ = try_record(&mut inner, &request);
                Err(CastError::Client(ClientError::Transport(
                    "simulated timeout after send".into(),
                )))
            }
            Some(SubmitFailure::DropBeforeRecord) => Err(CastError::Client(
                ClientError::Transport("simulated timeout before send".into()),
            )),
            None => try_record(&mut inner, &request),
        }
    }

    async fn decision_exists(
        &self,
        vote_id: &VoteId,
        node_id: &NodeId,
    ) -> Result<bool, ClientError> {
        Ok(self
            .lock()
            .decisions
            .contains_key(&(vote_id.clone(), node_id.clone())))
    }
}

impl LedgerService for NullTallyService {
    async fn account_balance(&self, address: &AccountAddress) -> Result<u128, ClientError> {
        self.lock()
            .balances
            .get(address)
            .copied()
            .ok_or_else(|| ClientError::Gateway(format!("unknown account {address}")))
    }
}
