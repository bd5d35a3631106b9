//! Nullable elector directory — in-memory identities and accounts.

use std::collections::HashMap;

use concord_registry::{AccountRef, ElectorDirectory, ElectorIdentity, RegistryError};
use concord_types::{AccountAddress, OperatorId};

/// A deterministic in-memory [`ElectorDirectory`].
#[derive(Default)]
pub struct NullDirectory {
    identities: Vec<ElectorIdentity>,
    accounts: HashMap<AccountAddress, AccountRef>,
}

impl NullDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity (builder style).
    pub fn with_identity(mut self, identity: ElectorIdentity) -> Self {
        self.identities.push(identity);
        self
    }

    /// Register a ledger account (builder style).
    pub fn with_account(mut self, address: AccountAddress, balance: u128) -> Self {
        self.accounts.insert(
            address.clone(),
            AccountRef { address, balance },
        );
        self
    }
}

impl ElectorDirectory for NullDirectory {
    async fn controlled_identities(
        &self,
        operator: &OperatorId,
    ) -> Result<Vec<ElectorIdentity>, RegistryError> {
        Ok(self
            .identities
            .iter()
            .filter(|identity| identity.owner == *operator)
            .cloned()
            .collect())
    }

    async fn lookup_account(
        &self,
        address: &AccountAddress,
    ) -> Result<Option<AccountRef>, RegistryError> {
        Ok(self.accounts.get(address).cloned())
    }
}
