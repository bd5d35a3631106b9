//! The authenticated operator context.

use concord_registry::ElectorIdentity;
use concord_types::OperatorId;

/// An explicit session object carrying the authenticated operator.
///
/// Passed into registry and query calls instead of any global session
/// state; its load/store lifecycle belongs to the embedding application.
#[derive(Clone, Debug)]
pub struct OperatorSession {
    operator: OperatorId,
}

impl OperatorSession {
    pub fn new(operator: OperatorId) -> Self {
        Self { operator }
    }

    pub fn operator(&self) -> &OperatorId {
        &self.operator
    }

    /// Whether `identity` is registered under this session's operator.
    pub fn controls(&self, identity: &ElectorIdentity) -> bool {
        identity.owner == self.operator
    }
}
