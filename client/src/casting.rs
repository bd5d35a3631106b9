//! The vote-casting protocol state machine.
//!
//! One instance drives one operator's single decision on one vote:
//! identity selection, credential confirmation, submission, and (when the
//! transport fails mid-submit) reconciliation against authoritative state.
//!
//! `Idle → IdentitySelected → Authorizing → Submitting → {Accepted | Rejected}`
//!
//! `Unconfirmed` is entered when a submission's outcome is unknown (the
//! request may or may not have landed); [`VoteCasting::reconcile`] is the
//! only way out. Instances are discarded after a terminal outcome.

use tracing::{info, warn};
use zeroize::Zeroizing;

use concord_governance::{DecisionChoice, SubjectKind};
use concord_registry::{AccountRef, ElectorIdentity};
use concord_types::VoteId;

use crate::error::CastError;
use crate::service::{DecisionRequest, TallyService};
use crate::session::OperatorSession;

/// Expected secret length: a 32-byte account key, hex-encoded.
const SECRET_HEX_LEN: usize = 64;

/// Where a [`VoteCasting`] instance currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastingState {
    /// A vote has been chosen; no identity selected yet.
    Idle,
    /// An eligible identity (and its backing account) is selected.
    IdentitySelected,
    /// Credential received, local shape validation in progress.
    Authorizing,
    /// Credential passed the pre-check; ready to submit.
    Submitting,
    /// A submission was sent but its outcome is unknown.
    Unconfirmed,
    /// The decision is durably recorded server-side.
    Accepted,
    /// The attempt ended in a non-retryable rejection.
    Rejected,
}

impl CastingState {
    /// Terminal states: the instance is spent and should be discarded.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::IdentitySelected => "identity-selected",
            Self::Authorizing => "authorizing",
            Self::Submitting => "submitting",
            Self::Unconfirmed => "unconfirmed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// The identities usable for a vote of `kind`: active and of an eligible
/// class.
pub fn eligible_identities<'a>(
    kind: SubjectKind,
    identities: &'a [ElectorIdentity],
) -> Vec<&'a ElectorIdentity> {
    identities
        .iter()
        .filter(|identity| identity.may_cast() && kind.is_class_eligible(identity.node_class))
        .collect()
}

/// Report [`CastError::NoEligibleIdentity`] when the operator controls no
/// usable identity for a vote of `kind`, never as a silent no-op.
pub fn ensure_eligible(
    kind: SubjectKind,
    identities: &[ElectorIdentity],
) -> Result<(), CastError> {
    if eligible_identities(kind, identities).is_empty() {
        Err(CastError::NoEligibleIdentity)
    } else {
        Ok(())
    }
}

/// One in-progress cast: single owner, one in-flight submission at a time,
/// discarded after a terminal outcome.
pub struct VoteCasting {
    vote_id: VoteId,
    kind: SubjectKind,
    state: CastingState,
    identity: Option<ElectorIdentity>,
    backing: Option<AccountRef>,
    secret: Option<Zeroizing<String>>,
}

impl VoteCasting {
    /// Start a cast against one vote. The machine begins in `Idle`.
    pub fn new(vote_id: VoteId, kind: SubjectKind) -> Self {
        Self {
            vote_id,
            kind,
            state: CastingState::Idle,
            identity: None,
            backing: None,
            secret: None,
        }
    }

    pub fn state(&self) -> CastingState {
        self.state
    }

    pub fn vote_id(&self) -> &VoteId {
        &self.vote_id
    }

    pub fn identity(&self) -> Option<&ElectorIdentity> {
        self.identity.as_ref()
    }

    pub fn backing_account(&self) -> Option<&AccountRef> {
        self.backing.as_ref()
    }

    /// Select the identity to vote with, along with its resolved backing
    /// account. Allowed from `Idle` and `IdentitySelected` (re-selection
    /// before submitting is fine).
    ///
    /// The identity must belong to the session's operator, be active, and
    /// be of a class this vote accepts.
    pub fn select_identity(
        &mut self,
        session: &OperatorSession,
        identity: ElectorIdentity,
        backing: AccountRef,
    ) -> Result<(), CastError> {
        match self.state {
            CastingState::Idle | CastingState::IdentitySelected => {}
            state => {
                return Err(CastError::NotReady {
                    action: "select an identity",
                    state: state.name(),
                })
            }
        }
        if !session.controls(&identity) {
            return Err(CastError::NotControlled(identity.node_id));
        }
        if !identity.may_cast() || !self.kind.is_class_eligible(identity.node_class) {
            return Err(CastError::IneligibleIdentity(identity.node_id));
        }
        self.identity = Some(identity);
        self.backing = Some(backing);
        self.secret = None;
        self.state = CastingState::IdentitySelected;
        Ok(())
    }

    /// Confirm the backing account's credential.
    ///
    /// Only a local shape pre-check (64 hex characters), never a
    /// substitute for the gateway's authorization. On success the machine
    /// is ready to submit; on failure it stays on the selected identity so
    /// the operator can retype the secret.
    pub fn provide_credential(&mut self, secret: &str) -> Result<(), CastError> {
        if self.state != CastingState::IdentitySelected {
            return Err(CastError::NotReady {
                action: "provide a credential",
                state: self.state.name(),
            });
        }
        self.state = CastingState::Authorizing;
        if secret.len() != SECRET_HEX_LEN || !secret.chars().all(|c| c.is_ascii_hexdigit()) {
            self.state = CastingState::IdentitySelected;
            return Err(CastError::MalformedSecret {
                expected: SECRET_HEX_LEN,
                got: secret.len(),
            });
        }
        self.secret = Some(Zeroizing::new(secret.to_string()));
        self.state = CastingState::Submitting;
        Ok(())
    }

    /// Submit the decision to the authoritative tally service.
    ///
    /// Requires `Submitting`; the `&mut` receiver plus the state check
    /// serialize submissions for this `(vote, node)` pair, so a double
    /// click or duplicate retry can never produce two counted decisions
    /// from this instance. The secret is consumed whatever the outcome.
    ///
    /// After `Accepted` the caller must refresh the backing account's
    /// balance and the vote's tally through
    /// [`crate::VoteQueryService::refresh_after_cast`]; a further `submit`
    /// here reports `DuplicateDecision` without a network round-trip.
    pub async fn submit<S: TallyService>(
        &mut self,
        choice: DecisionChoice,
        service: &S,
    ) -> Result<(), CastError> {
        match self.state {
            CastingState::Submitting => {}
            CastingState::Accepted => {
                // already observed Accepted: locally idempotent, no round-trip
                return Err(match self.identity.as_ref() {
                    Some(identity) => CastError::DuplicateDecision(identity.node_id.clone()),
                    None => CastError::NotReady {
                        action: "submit",
                        state: self.state.name(),
                    },
                });
            }
            CastingState::Unconfirmed => return Err(CastError::NeedsReconcile),
            state => {
                return Err(CastError::NotReady {
                    action: "submit",
                    state: state.name(),
                })
            }
        }

        let (identity, backing, secret) =
            match (self.identity.as_ref(), self.backing.as_ref(), self.secret.take()) {
                (Some(identity), Some(backing), Some(secret)) => (identity, backing, secret),
                _ => {
                    return Err(CastError::NotReady {
                        action: "submit",
                        state: self.state.name(),
                    })
                }
            };

        let request = DecisionRequest {
            vote_id: &self.vote_id,
            node_id: &identity.node_id,
            choice,
            backing_account: &backing.address,
            secret: &secret,
        };

        match service.submit_decision(request).await {
            Ok(()) => {
                info!(vote = %self.vote_id, node = %identity.node_id, %choice, "decision accepted");
                self.state = CastingState::Accepted;
                Ok(())
            }
            Err(err) => {
                self.state = match &err {
                    // retryable with a corrected secret; selection retained
                    CastError::Unauthorized => CastingState::IdentitySelected,
                    // re-checkable after the node is reactivated externally
                    CastError::IneligibleIdentity(_) | CastError::NotControlled(_) => {
                        CastingState::IdentitySelected
                    }
                    // retrying cannot succeed
                    CastError::DuplicateDecision(_) | CastError::VoteClosed => {
                        CastingState::Rejected
                    }
                    // outcome unknown: the request may have landed
                    CastError::Client(_) => CastingState::Unconfirmed,
                    _ => CastingState::IdentitySelected,
                };
                warn!(vote = %self.vote_id, node = %identity.node_id, error = %err, "decision not accepted");
                Err(err)
            }
        }
    }

    /// Resolve an `Unconfirmed` submission by asking the tally service
    /// whether the decision landed.
    ///
    /// Returns `Ok(true)` (now `Accepted`) when it did, `Ok(false)` (back
    /// to `IdentitySelected`, secret discarded) when it did not; only then
    /// is a retry safe.
    pub async fn reconcile<S: TallyService>(&mut self, service: &S) -> Result<bool, CastError> {
        if self.state != CastingState::Unconfirmed {
            return Err(CastError::NotReady {
                action: "reconcile",
                state: self.state.name(),
            });
        }
        let node_id = match self.identity.as_ref() {
            Some(identity) => &identity.node_id,
            None => {
                return Err(CastError::NotReady {
                    action: "reconcile",
                    state: self.state.name(),
                })
            }
        };
        let landed = service.decision_exists(&self.vote_id, node_id).await?;
        if landed {
            info!(vote = %self.vote_id, node = %node_id, "unconfirmed submission had landed");
            self.state = CastingState::Accepted;
        } else {
            self.state = CastingState::IdentitySelected;
        }
        Ok(landed)
    }
}
