//! HTTP client for the Concord gateway.
//!
//! The gateway speaks an action-keyed JSON dialect: every request is a POST
//! whose body carries an `action` field plus parameters, every response is
//! `{"result": ...}` or `{"error": "..."}`. Response shapes drifted across
//! gateway versions (several fields appear under more than one name), so
//! every payload is deserialized into a wire struct here and normalized
//! into the canonical governance types in one explicit step; business
//! logic never branches on which field name was present.

use serde::Deserialize;
use std::time::Duration;

use concord_governance::{SubjectKind, VoteStatus, VoteTally, DEFAULT_VOTING_WINDOW_SECS};
use concord_registry::{AccountRef, ElectorDirectory, ElectorIdentity, RegistryError};
use concord_types::{
    AccountAddress, NodeId, OperatorId, SubjectId, Timestamp, VoteId,
};

use crate::error::{CastError, ClientError};
use crate::query::VoteSummary;
use crate::service::{DecisionRequest, LedgerService, TallyService};

/// HTTP client for communicating with a Concord gateway.
///
/// Wraps `reqwest::Client` with the gateway's base URL and provides typed
/// methods for each action the governance core needs.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    gateway_url: String,
}

impl GatewayClient {
    /// Create a new client targeting the given base URL
    /// (e.g. `http://127.0.0.1:8091`).
    pub fn new(gateway_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            gateway_url: gateway_url.into(),
        })
    }

    /// The configured gateway URL.
    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// Send an action request and return the `result` field.
    async fn rpc_call(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let mut body = params;
        body.as_object_mut()
            .ok_or_else(|| ClientError::Transport("params must be a JSON object".into()))?
            .insert("action".to_string(), serde_json::json!(action));

        let response = self
            .http
            .post(&self.gateway_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ClientError::Gateway(format!(
                "gateway returned HTTP {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("invalid JSON response: {e}")))?;

        if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
            return Err(ClientError::Gateway(err.to_string()));
        }

        Ok(json.get("result").cloned().unwrap_or(json))
    }
}

// ── Wire shapes ─────────────────────────────────────────────────────────

/// Response from `votes_open`.
#[derive(Debug, Clone, Deserialize)]
struct OpenVotesWire {
    #[serde(default)]
    votes: Vec<VoteSummaryWire>,
}

/// One open-vote entry as the gateway lists it.
#[derive(Debug, Clone, Deserialize)]
struct VoteSummaryWire {
    #[serde(alias = "id")]
    vote_id: String,
    #[serde(alias = "applicant_id")]
    subject_id: String,
    #[serde(alias = "vote_type")]
    kind: String,
    #[serde(default)]
    description: Option<String>,
    submitted_at: u64,
    #[serde(default)]
    expires_at: u64,
    /// Zero means the operator has not voted.
    #[serde(default)]
    voted_at: u64,
}

impl VoteSummaryWire {
    fn normalize(self) -> Result<VoteSummary, ClientError> {
        let kind: SubjectKind = self
            .kind
            .parse()
            .map_err(|e| ClientError::InvalidResponse(format!("vote {}: {e}", self.vote_id)))?;
        let submitted_at = Timestamp::new(self.submitted_at);
        // older gateways omit expires_at; the window is fixed network-wide
        let expires_at = if self.expires_at == 0 {
            submitted_at.plus_secs(DEFAULT_VOTING_WINDOW_SECS)
        } else {
            Timestamp::new(self.expires_at)
        };
        Ok(VoteSummary {
            vote_id: VoteId::new(self.vote_id),
            subject_id: SubjectId::new(self.subject_id),
            kind,
            description: self.description,
            submitted_at,
            expires_at,
            voted_at: (self.voted_at != 0).then(|| Timestamp::new(self.voted_at)),
        })
    }
}

/// Response from `vote_tally`.
#[derive(Debug, Clone, Deserialize)]
struct TallyWire {
    #[serde(alias = "id")]
    vote_id: String,
    status: String,
    submitted_at: u64,
    #[serde(default)]
    expires_at: u64,
    #[serde(default)]
    validator_approve: u32,
    #[serde(default)]
    validator_reject: u32,
    #[serde(default, alias = "full_node_approve")]
    fullnode_approve: u32,
    #[serde(default, alias = "full_node_reject")]
    fullnode_reject: u32,
    total_validators: u32,
    #[serde(alias = "total_full_nodes")]
    total_fullnodes: u32,
}

impl TallyWire {
    fn normalize(self) -> Result<VoteTally, ClientError> {
        let status: VoteStatus = self
            .status
            .parse()
            .map_err(|e| ClientError::InvalidResponse(format!("vote {}: {e}", self.vote_id)))?;
        let submitted_at = Timestamp::new(self.submitted_at);
        let expires_at = if self.expires_at == 0 {
            submitted_at.plus_secs(DEFAULT_VOTING_WINDOW_SECS)
        } else {
            Timestamp::new(self.expires_at)
        };
        let tally = VoteTally {
            vote_id: VoteId::new(self.vote_id),
            status,
            submitted_at,
            expires_at,
            validator_approve: self.validator_approve,
            validator_reject: self.validator_reject,
            fullnode_approve: self.fullnode_approve,
            fullnode_reject: self.fullnode_reject,
            total_validators: self.total_validators,
            total_fullnodes: self.total_fullnodes,
        };
        tally.check_counters()?;
        Ok(tally)
    }
}

/// Response from `vote_cast`.
#[derive(Debug, Clone, Deserialize)]
struct CastResultWire {
    accepted: bool,
    #[serde(default)]
    detail: Option<String>,
}

/// Response from `vote_decision`.
#[derive(Debug, Clone, Deserialize)]
struct DecisionExistsWire {
    #[serde(default)]
    exists: bool,
}

/// Response from `node_list`.
#[derive(Debug, Clone, Deserialize)]
struct NodeListWire {
    #[serde(default)]
    nodes: Vec<NodeWire>,
}

/// One node entry as the gateway lists it.
#[derive(Debug, Clone, Deserialize)]
struct NodeWire {
    #[serde(alias = "id")]
    node_id: String,
    #[serde(alias = "class")]
    node_class: String,
    status: String,
    #[serde(alias = "account")]
    backing_account: String,
    owner: String,
    #[serde(default, alias = "name")]
    display_name: Option<String>,
}

impl NodeWire {
    fn normalize(self) -> Result<ElectorIdentity, ClientError> {
        let node_class = self
            .node_class
            .parse()
            .map_err(|e| ClientError::InvalidResponse(format!("node {}: {e}", self.node_id)))?;
        let status = self
            .status
            .parse()
            .map_err(|e| ClientError::InvalidResponse(format!("node {}: {e}", self.node_id)))?;
        let backing_account = AccountAddress::parse(self.backing_account)
            .map_err(|e| ClientError::InvalidResponse(format!("node {}: {e}", self.node_id)))?;
        Ok(ElectorIdentity {
            node_id: NodeId::new(self.node_id),
            node_class,
            status,
            backing_account,
            owner: OperatorId::new(self.owner),
            display_name: self.display_name,
        })
    }
}

/// Response from `account_info`.
#[derive(Debug, Clone, Deserialize)]
struct AccountLookupWire {
    #[serde(default)]
    account: Option<AccountWire>,
}

#[derive(Debug, Clone, Deserialize)]
struct AccountWire {
    address: String,
    /// Raw ledger units, string-encoded (u128 does not fit JSON numbers).
    balance: String,
}

impl AccountWire {
    fn normalize(self) -> Result<AccountRef, ClientError> {
        let address = AccountAddress::parse(self.address)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let balance = self
            .balance
            .parse::<u128>()
            .map_err(|e| ClientError::InvalidResponse(format!("invalid balance: {e}")))?;
        Ok(AccountRef { address, balance })
    }
}

/// Response from `account_balance`.
#[derive(Debug, Clone, Deserialize)]
struct BalanceWire {
    balance: String,
}

/// Map a `vote_cast` rejection detail onto the typed taxonomy.
///
/// Detail spellings also drifted across gateway versions; this is the only
/// place that knows them.
fn map_cast_rejection(detail: Option<String>, node_id: &NodeId) -> CastError {
    match detail.as_deref() {
        Some("unauthorized") | Some("bad_secret") => CastError::Unauthorized,
        Some("duplicate_decision") | Some("already_voted") => {
            CastError::DuplicateDecision(node_id.clone())
        }
        Some("vote_closed") | Some("vote_expired") => CastError::VoteClosed,
        Some("ineligible_identity") | Some("node_inactive") => {
            CastError::IneligibleIdentity(node_id.clone())
        }
        Some(other) => CastError::Client(ClientError::Gateway(format!(
            "cast rejected: {other}"
        ))),
        None => CastError::Client(ClientError::Gateway("cast rejected without detail".into())),
    }
}

// ── Service implementations ─────────────────────────────────────────────

impl TallyService for GatewayClient {
    async fn list_open_votes(
        &self,
        operator: &OperatorId,
    ) -> Result<Vec<VoteSummary>, ClientError> {
        let result = self
            .rpc_call(
                "votes_open",
                serde_json::json!({ "operator": operator.as_str() }),
            )
            .await?;
        let wire: OpenVotesWire = serde_json::from_value(result)
            .map_err(|e| ClientError::InvalidResponse(format!("invalid votes_open response: {e}")))?;
        wire.votes.into_iter().map(VoteSummaryWire::normalize).collect()
    }

    async fn get_tally(&self, vote_id: &VoteId) -> Result<VoteTally, ClientError> {
        let result = self
            .rpc_call("vote_tally", serde_json::json!({ "vote": vote_id.as_str() }))
            .await?;
        let wire: TallyWire = serde_json::from_value(result)
            .map_err(|e| ClientError::InvalidResponse(format!("invalid vote_tally response: {e}")))?;
        wire.normalize()
    }

    async fn submit_decision(&self, request: DecisionRequest<'_>) -> Result<(), CastError> {
        let result = self
            .rpc_call(
                "vote_cast",
                serde_json::json!({
                    "vote": request.vote_id.as_str(),
                    "node": request.node_id.as_str(),
                    "decision": request.choice.as_str(),
                    "account": request.backing_account.as_str(),
                    "secret": request.secret,
                }),
            )
            .await?;
        let wire: CastResultWire = serde_json::from_value(result).map_err(|e| {
            ClientError::InvalidResponse(format!("invalid vote_cast response: {e}"))
        })?;
        if wire.accepted {
            Ok(())
        } else {
            Err(map_cast_rejection(wire.detail, request.node_id))
        }
    }

    async fn decision_exists(
        &self,
        vote_id: &VoteId,
        node_id: &NodeId,
    ) -> Result<bool, ClientError> {
        let result = self
            .rpc_call(
                "vote_decision",
                serde_json::json!({
                    "vote": vote_id.as_str(),
                    "node": node_id.as_str(),
                }),
            )
            .await?;
        let wire: DecisionExistsWire = serde_json::from_value(result).map_err(|e| {
            ClientError::InvalidResponse(format!("invalid vote_decision response: {e}"))
        })?;
        Ok(wire.exists)
    }
}

impl LedgerService for GatewayClient {
    async fn account_balance(&self, address: &AccountAddress) -> Result<u128, ClientError> {
        let result = self
            .rpc_call(
                "account_balance",
                serde_json::json!({ "account": address.as_str() }),
            )
            .await?;
        let wire: BalanceWire = serde_json::from_value(result).map_err(|e| {
            ClientError::InvalidResponse(format!("invalid account_balance response: {e}"))
        })?;
        wire.balance
            .parse::<u128>()
            .map_err(|e| ClientError::InvalidResponse(format!("invalid balance: {e}")))
    }
}

impl ElectorDirectory for GatewayClient {
    async fn controlled_identities(
        &self,
        operator: &OperatorId,
    ) -> Result<Vec<ElectorIdentity>, RegistryError> {
        let result = self
            .rpc_call(
                "node_list",
                serde_json::json!({ "operator": operator.as_str() }),
            )
            .await
            .map_err(|e| RegistryError::Directory(e.to_string()))?;
        let wire: NodeListWire = serde_json::from_value(result)
            .map_err(|e| RegistryError::Directory(format!("invalid node_list response: {e}")))?;
        wire.nodes
            .into_iter()
            .map(|node| node.normalize().map_err(|e| RegistryError::Directory(e.to_string())))
            .collect()
    }

    async fn lookup_account(
        &self,
        address: &AccountAddress,
    ) -> Result<Option<AccountRef>, RegistryError> {
        let result = self
            .rpc_call(
                "account_info",
                serde_json::json!({ "account": address.as_str() }),
            )
            .await
            .map_err(|e| RegistryError::Directory(e.to_string()))?;
        let wire: AccountLookupWire = serde_json::from_value(result)
            .map_err(|e| RegistryError::Directory(format!("invalid account_info response: {e}")))?;
        wire.account
            .map(|account| account.normalize().map_err(|e| RegistryError::Directory(e.to_string())))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_types::NodeClass;

    #[test]
    fn summary_normalizes_zero_voted_at_to_none() {
        let wire: VoteSummaryWire = serde_json::from_value(serde_json::json!({
            "vote_id": "v-1",
            "subject_id": "n-9",
            "kind": "node_join",
            "submitted_at": 1_000,
            "expires_at": 2_000,
            "voted_at": 0,
        }))
        .unwrap();
        let summary = wire.normalize().unwrap();
        assert_eq!(summary.voted_at, None);
        assert!(!summary.already_voted());
    }

    #[test]
    fn summary_accepts_aliased_field_names() {
        let wire: VoteSummaryWire = serde_json::from_value(serde_json::json!({
            "id": "v-2",
            "applicant_id": "l2-4",
            "vote_type": "l2_register",
            "submitted_at": 5_000,
            "voted_at": 6_000,
        }))
        .unwrap();
        let summary = wire.normalize().unwrap();
        assert_eq!(summary.vote_id.as_str(), "v-2");
        assert_eq!(summary.kind, SubjectKind::L2Register);
        assert_eq!(summary.voted_at, Some(Timestamp::new(6_000)));
        // absent expires_at falls back to the fixed window
        assert_eq!(
            summary.expires_at,
            Timestamp::new(5_000 + DEFAULT_VOTING_WINDOW_SECS)
        );
    }

    #[test]
    fn tally_accepts_both_fullnode_spellings() {
        let wire: TallyWire = serde_json::from_value(serde_json::json!({
            "vote_id": "v-3",
            "status": "pending",
            "submitted_at": 100,
            "expires_at": 200,
            "validator_approve": 1,
            "full_node_approve": 2,
            "total_validators": 3,
            "total_full_nodes": 4,
        }))
        .unwrap();
        let tally = wire.normalize().unwrap();
        assert_eq!(tally.fullnode_approve, 2);
        assert_eq!(tally.total_fullnodes, 4);
        assert_eq!(tally.validator_progress(), 33);
    }

    #[test]
    fn tally_normalization_rejects_overflowing_counters() {
        let wire: TallyWire = serde_json::from_value(serde_json::json!({
            "vote_id": "v-4",
            "status": "pending",
            "submitted_at": 100,
            "expires_at": 200,
            "validator_approve": 5,
            "total_validators": 3,
            "total_fullnodes": 2,
        }))
        .unwrap();
        assert!(matches!(wire.normalize(), Err(ClientError::Data(_))));
    }

    #[test]
    fn tally_normalization_rejects_unknown_status() {
        let wire: TallyWire = serde_json::from_value(serde_json::json!({
            "vote_id": "v-5",
            "status": "tallying",
            "submitted_at": 100,
            "total_validators": 3,
            "total_fullnodes": 2,
        }))
        .unwrap();
        assert!(matches!(wire.normalize(), Err(ClientError::InvalidResponse(_))));
    }

    #[test]
    fn node_normalizes_aliases_and_enums() {
        let wire: NodeWire = serde_json::from_value(serde_json::json!({
            "id": "nd-7",
            "class": "full_node",
            "status": "suspended",
            "account": "cncd_abc123",
            "owner": "op-1",
            "name": "rack 3",
        }))
        .unwrap();
        let identity = wire.normalize().unwrap();
        assert_eq!(identity.node_class, NodeClass::FullNode);
        assert!(!identity.may_cast());
        assert_eq!(identity.display_name.as_deref(), Some("rack 3"));
    }

    #[test]
    fn cast_rejection_details_map_to_distinct_kinds() {
        let node = NodeId::new("nd-1");
        assert!(matches!(
            map_cast_rejection(Some("bad_secret".into()), &node),
            CastError::Unauthorized
        ));
        assert!(matches!(
            map_cast_rejection(Some("already_voted".into()), &node),
            CastError::DuplicateDecision(_)
        ));
        assert!(matches!(
            map_cast_rejection(Some("vote_expired".into()), &node),
            CastError::VoteClosed
        ));
        assert!(matches!(
            map_cast_rejection(Some("node_inactive".into()), &node),
            CastError::IneligibleIdentity(_)
        ));
        assert!(matches!(
            map_cast_rejection(Some("fee_account_frozen".into()), &node),
            CastError::Client(ClientError::Gateway(_))
        ));
    }

    #[test]
    fn account_balance_is_string_encoded() {
        let wire: AccountWire = serde_json::from_value(serde_json::json!({
            "address": "cncd_xyz",
            "balance": "340282366920938463463374607431768211455",
        }))
        .unwrap();
        let account = wire.normalize().unwrap();
        assert_eq!(account.balance, u128::MAX);
    }
}
