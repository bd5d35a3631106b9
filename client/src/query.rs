//! Open-vote listing, tally fan-out, and post-cast reconciliation.
//!
//! The vote list and the per-vote tallies are two independently stale
//! caches. After an accepted cast both are refetched from authoritative
//! state; optimistic local increments are not done anywhere because the
//! quorum rule lives server-side and a client-side increment could show a
//! wrong status before the server's.

use std::collections::HashMap;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use concord_governance::{SubjectKind, VoteTally};
use concord_types::{AccountAddress, SubjectId, Timestamp, VoteId};

use crate::error::ClientError;
use crate::service::{LedgerService, TallyService};
use crate::session::OperatorSession;

/// How many tally fetches are in flight at once during a listing refresh.
const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Minimal identifying fields of one open vote, as listed by the gateway.
///
/// Counters are deliberately absent; they come from the per-vote tally.
#[derive(Clone, Debug)]
pub struct VoteSummary {
    pub vote_id: VoteId,
    pub subject_id: SubjectId,
    pub kind: SubjectKind,
    pub description: Option<String>,
    pub submitted_at: Timestamp,
    pub expires_at: Timestamp,
    /// When the current operator decided this vote; `None` means not yet
    /// voted (the wire's zero timestamp is normalized to `None`, never
    /// treated as a valid decision time).
    pub voted_at: Option<Timestamp>,
}

impl VoteSummary {
    pub fn already_voted(&self) -> bool {
        self.voted_at.is_some()
    }
}

/// One open vote assembled for display: the summary plus the freshest tally
/// available. `tally` is `None` only when no fetch for it ever succeeded.
#[derive(Clone, Debug)]
pub struct OpenVote {
    pub summary: VoteSummary,
    pub tally: Option<VoteTally>,
}

/// Read side of the governance core, with a last-known-good tally cache.
pub struct VoteQueryService<S> {
    service: S,
    session: OperatorSession,
    max_in_flight: usize,
    tallies: HashMap<VoteId, VoteTally>,
}

impl<S: TallyService> VoteQueryService<S> {
    pub fn new(service: S, session: OperatorSession) -> Self {
        Self {
            service,
            session,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            tallies: HashMap::new(),
        }
    }

    /// Cap the number of concurrent tally fetches (minimum 1).
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn session(&self) -> &OperatorSession {
        &self.session
    }

    /// The last tally this service successfully fetched for `vote_id`.
    pub fn cached_tally(&self, vote_id: &VoteId) -> Option<&VoteTally> {
        self.tallies.get(vote_id)
    }

    /// The open proposals for the session's operator. Pure read; a failure
    /// here leaves every cached tally untouched.
    pub async fn list_open_votes(&self) -> Result<Vec<VoteSummary>, ClientError> {
        let summaries = self.service.list_open_votes(self.session.operator()).await?;
        debug!(count = summaries.len(), "listed open votes");
        Ok(summaries)
    }

    /// The current tally for one vote, freshly fetched.
    ///
    /// On a failed fetch the last-known-good tally is returned instead,
    /// with a warning; the error surfaces only when nothing was ever
    /// fetched for this vote.
    pub async fn tally(&mut self, vote_id: &VoteId) -> Result<&VoteTally, ClientError> {
        match self.service.get_tally(vote_id).await {
            Ok(tally) => {
                self.tallies.insert(vote_id.clone(), tally);
            }
            Err(err) => {
                if !self.tallies.contains_key(vote_id) {
                    return Err(err);
                }
                warn!(vote = %vote_id, error = %err, "tally refresh failed, showing last known good");
            }
        }
        Ok(&self.tallies[vote_id])
    }

    /// List open votes and fetch each one's tally with bounded concurrency.
    ///
    /// Tally fetches are independent: one failure keeps that vote's
    /// last-known-good tally (or omits it when never fetched) and never
    /// fails the batch. Only the listing itself is a hard error.
    pub async fn fetch_open_with_tallies(&mut self) -> Result<Vec<OpenVote>, ClientError> {
        let summaries = self.list_open_votes().await?;

        let service = &self.service;
        let fetched: Vec<(VoteId, Result<VoteTally, ClientError>)> =
            stream::iter(summaries.iter().map(|summary| summary.vote_id.clone()))
                .map(|vote_id| async move {
                    let result = service.get_tally(&vote_id).await;
                    (vote_id, result)
                })
                .buffer_unordered(self.max_in_flight)
                .collect()
                .await;

        for (vote_id, result) in fetched {
            match result {
                Ok(tally) => {
                    self.tallies.insert(vote_id, tally);
                }
                Err(err) => {
                    warn!(vote = %vote_id, error = %err, "tally fetch failed, keeping last known good");
                }
            }
        }

        Ok(summaries
            .into_iter()
            .map(|summary| {
                let tally = self.tallies.get(&summary.vote_id).cloned();
                OpenVote { summary, tally }
            })
            .collect())
    }

    /// Refresh authoritative state after an accepted cast: drop the cached
    /// tally and balance view, then refetch both.
    ///
    /// Stale reads after a successful cast are a correctness bug, so unlike
    /// [`Self::tally`] this does not fall back to last-known-good: a
    /// failure propagates and the cache entry stays invalidated.
    pub async fn refresh_after_cast<L: LedgerService>(
        &mut self,
        vote_id: &VoteId,
        account: &AccountAddress,
        ledger: &L,
    ) -> Result<(VoteTally, u128), ClientError> {
        self.tallies.remove(vote_id);
        let tally = self.service.get_tally(vote_id).await?;
        self.tallies.insert(vote_id.clone(), tally.clone());
        let balance = ledger.account_balance(account).await?;
        debug!(vote = %vote_id, account = %account, balance, "post-cast state refreshed");
        Ok((tally, balance))
    }
}
