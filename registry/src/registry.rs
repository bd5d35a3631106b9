//! Registry lookups over an abstract directory source.

use concord_types::OperatorId;
use tracing::debug;

use crate::elector::{AccountRef, ElectorIdentity};
use crate::error::RegistryError;

/// Data source for identity and account lookups.
///
/// Implemented by the gateway transport in production and by an in-memory
/// nullable in tests, so registry callers never touch the network directly.
#[allow(async_fn_in_trait)]
pub trait ElectorDirectory {
    /// All node identities registered under `operator`.
    async fn controlled_identities(
        &self,
        operator: &OperatorId,
    ) -> Result<Vec<ElectorIdentity>, RegistryError>;

    /// Look up a ledger account by address; `None` if it does not exist.
    async fn lookup_account(
        &self,
        address: &concord_types::AccountAddress,
    ) -> Result<Option<AccountRef>, RegistryError>;
}

impl<D: ElectorDirectory> ElectorDirectory for &D {
    async fn controlled_identities(
        &self,
        operator: &OperatorId,
    ) -> Result<Vec<ElectorIdentity>, RegistryError> {
        (**self).controlled_identities(operator).await
    }

    async fn lookup_account(
        &self,
        address: &concord_types::AccountAddress,
    ) -> Result<Option<AccountRef>, RegistryError> {
        (**self).lookup_account(address).await
    }
}

/// Read-only resolution of operator-controlled identities and the accounts
/// that back their votes.
pub struct ElectorRegistry<D> {
    directory: D,
}

impl<D: ElectorDirectory> ElectorRegistry<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// The identities `operator` controls, every status included; callers
    /// must check [`ElectorIdentity::may_cast`] before allowing a cast.
    ///
    /// Identities the directory reports under a different owner are dropped
    /// here; a session can never see, and so never vote with, another
    /// operator's nodes.
    pub async fn list_controlled_identities(
        &self,
        operator: &OperatorId,
    ) -> Result<Vec<ElectorIdentity>, RegistryError> {
        let mut identities = self.directory.controlled_identities(operator).await?;
        identities.retain(|identity| identity.owner == *operator);
        debug!(
            operator = %operator,
            count = identities.len(),
            "resolved controlled identities"
        );
        Ok(identities)
    }

    /// Resolve the funding account backing `identity`. The mapping is 1:1
    /// and deterministic; a missing account is a hard
    /// [`RegistryError::UnresolvedBackingAccount`] fault.
    pub async fn resolve_backing_account(
        &self,
        identity: &ElectorIdentity,
    ) -> Result<AccountRef, RegistryError> {
        match self.directory.lookup_account(&identity.backing_account).await? {
            Some(account) => Ok(account),
            None => Err(RegistryError::UnresolvedBackingAccount(
                identity.node_id.clone(),
            )),
        }
    }
}
