//! Registry resolution against the nullable directory.

use concord_nullables::NullDirectory;
use concord_registry::{
    AccountRef, ElectorDirectory, ElectorIdentity, ElectorRegistry, RegistryError,
};
use concord_types::{AccountAddress, NodeClass, NodeId, NodeStatus, OperatorId};

fn identity(node: &str, owner: &str, status: NodeStatus) -> ElectorIdentity {
    ElectorIdentity {
        node_id: NodeId::new(node),
        node_class: NodeClass::Validator,
        status,
        backing_account: AccountAddress::new(format!("cncd_{node}")),
        owner: OperatorId::new(owner),
        display_name: None,
    }
}

#[tokio::test]
async fn lists_only_the_operators_identities() {
    let directory = NullDirectory::new()
        .with_identity(identity("n1", "op-1", NodeStatus::Active))
        .with_identity(identity("n2", "op-1", NodeStatus::Inactive))
        .with_identity(identity("n3", "op-2", NodeStatus::Active));
    let registry = ElectorRegistry::new(directory);

    let identities = registry
        .list_controlled_identities(&OperatorId::new("op-1"))
        .await
        .unwrap();
    let nodes: Vec<&str> = identities.iter().map(|i| i.node_id.as_str()).collect();
    assert_eq!(nodes, ["n1", "n2"]);
}

#[tokio::test]
async fn listing_does_not_filter_by_status() {
    let directory = NullDirectory::new()
        .with_identity(identity("n1", "op-1", NodeStatus::Retired))
        .with_identity(identity("n2", "op-1", NodeStatus::Pending));
    let registry = ElectorRegistry::new(directory);

    let identities = registry
        .list_controlled_identities(&OperatorId::new("op-1"))
        .await
        .unwrap();
    assert_eq!(identities.len(), 2);
    assert!(identities.iter().all(|i| !i.may_cast()));
}

#[tokio::test]
async fn unknown_operator_gets_an_empty_list() {
    let directory = NullDirectory::new().with_identity(identity("n1", "op-1", NodeStatus::Active));
    let registry = ElectorRegistry::new(directory);

    let identities = registry
        .list_controlled_identities(&OperatorId::new("op-404"))
        .await
        .unwrap();
    assert!(identities.is_empty());
}

#[tokio::test]
async fn resolves_the_backing_account() {
    let voter = identity("n1", "op-1", NodeStatus::Active);
    let directory = NullDirectory::new()
        .with_identity(voter.clone())
        .with_account(voter.backing_account.clone(), 12_345);
    let registry = ElectorRegistry::new(directory);

    let account = registry.resolve_backing_account(&voter).await.unwrap();
    assert_eq!(account.address, voter.backing_account);
    assert_eq!(account.balance, 12_345);
}

#[tokio::test]
async fn missing_backing_account_is_a_hard_error() {
    let voter = identity("n1", "op-1", NodeStatus::Active);
    // identity registered, its account missing from the ledger
    let directory = NullDirectory::new().with_identity(voter.clone());
    let registry = ElectorRegistry::new(directory);

    let err = registry.resolve_backing_account(&voter).await.unwrap_err();
    assert!(matches!(err, RegistryError::UnresolvedBackingAccount(node) if node.as_str() == "n1"));
}

/// A directory that misattributes rows, as a buggy or hostile gateway might.
struct LeakyDirectory;

impl ElectorDirectory for LeakyDirectory {
    async fn controlled_identities(
        &self,
        _operator: &OperatorId,
    ) -> Result<Vec<ElectorIdentity>, RegistryError> {
        Ok(vec![
            identity("n1", "op-1", NodeStatus::Active),
            identity("n9", "op-9", NodeStatus::Active),
        ])
    }

    async fn lookup_account(
        &self,
        _address: &AccountAddress,
    ) -> Result<Option<AccountRef>, RegistryError> {
        Ok(None)
    }
}

#[tokio::test]
async fn foreign_rows_from_the_directory_are_dropped() {
    let registry = ElectorRegistry::new(LeakyDirectory);
    let identities = registry
        .list_controlled_identities(&OperatorId::new("op-1"))
        .await
        .unwrap();
    let nodes: Vec<&str> = identities.iter().map(|i| i.node_id.as_str()).collect();
    assert_eq!(nodes, ["n1"]);
}
