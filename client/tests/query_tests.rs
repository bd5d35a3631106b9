//! Integration tests for the read side: listing, bounded tally fan-out,
//! last-known-good retention, and post-cast reconciliation.

use concord_client::{OperatorSession, VoteQueryService};
use concord_governance::{Proposal, SubjectKind, VoteStatus, VoteTally};
use concord_nullables::NullTallyService;
use concord_types::{
    AccountAddress, NodeClass, NodeId, NodeStatus, OperatorId, SubjectId, Timestamp, VoteId,
};

const NOW: u64 = 1_000_000;

fn proposal(subject: &str, kind: SubjectKind) -> Proposal {
    Proposal {
        subject_id: SubjectId::new(subject),
        kind,
        description: None,
    }
}

fn pending_tally(vote: &str, validator_approve: u32) -> VoteTally {
    VoteTally {
        vote_id: VoteId::new(vote),
        status: VoteStatus::Pending,
        submitted_at: Timestamp::new(NOW - 86_400),
        expires_at: Timestamp::new(NOW + 6 * 86_400),
        validator_approve,
        validator_reject: 0,
        fullnode_approve: 0,
        fullnode_reject: 0,
        total_validators: 5,
        total_fullnodes: 3,
    }
}

fn service_with_three_votes() -> NullTallyService {
    NullTallyService::new()
        .with_now(NOW)
        .with_vote(proposal("s-1", SubjectKind::NodeJoin), pending_tally("v1", 1))
        .with_vote(proposal("s-2", SubjectKind::L2Register), pending_tally("v2", 2))
        .with_vote(proposal("s-3", SubjectKind::NodeSlash), pending_tally("v3", 3))
}

fn session() -> OperatorSession {
    OperatorSession::new(OperatorId::new("op-1"))
}

#[tokio::test]
async fn fan_out_fetches_every_open_vote() {
    let service = service_with_three_votes();
    let mut query = VoteQueryService::new(&service, session()).with_max_in_flight(2);

    let open = query.fetch_open_with_tallies().await.unwrap();
    assert_eq!(open.len(), 3);
    // listing order is preserved even though fetches complete in any order
    let ids: Vec<&str> = open.iter().map(|v| v.summary.vote_id.as_str()).collect();
    assert_eq!(ids, ["v1", "v2", "v3"]);
    for (vote, expected_approve) in open.iter().zip([1u32, 2, 3]) {
        assert_eq!(vote.tally.as_ref().unwrap().validator_approve, expected_approve);
    }
}

#[tokio::test]
async fn one_failed_tally_does_not_fail_the_batch() {
    let service = service_with_three_votes();
    let mut query = VoteQueryService::new(&service, session());

    service.fail_next_tally(&VoteId::new("v2"));
    let open = query.fetch_open_with_tallies().await.unwrap();
    assert_eq!(open.len(), 3);
    assert!(open[0].tally.is_some());
    // never fetched successfully and this fetch failed: no tally to show
    assert!(open[1].tally.is_none());
    assert!(open[2].tally.is_some());
}

#[tokio::test]
async fn failed_refresh_keeps_last_known_good_tally() {
    let service = service_with_three_votes();
    let mut query = VoteQueryService::new(&service, session());
    let v2 = VoteId::new("v2");

    let open = query.fetch_open_with_tallies().await.unwrap();
    assert_eq!(open[1].tally.as_ref().unwrap().validator_approve, 2);

    // the next refresh fails; the previously fetched tally stays visible
    service.fail_next_tally(&v2);
    let open = query.fetch_open_with_tallies().await.unwrap();
    assert_eq!(open[1].tally.as_ref().unwrap().validator_approve, 2);
    assert_eq!(query.cached_tally(&v2).unwrap().validator_approve, 2);
}

#[tokio::test]
async fn single_tally_fetch_falls_back_to_cache_only_when_possible() {
    let service = service_with_three_votes();
    let mut query = VoteQueryService::new(&service, session());
    let v1 = VoteId::new("v1");

    // nothing cached yet: the failure surfaces
    service.fail_next_tally(&v1);
    assert!(query.tally(&v1).await.is_err());

    // cached now: a later failure falls back with the last known good
    query.tally(&v1).await.unwrap();
    service.fail_next_tally(&v1);
    let tally = query.tally(&v1).await.unwrap();
    assert_eq!(tally.validator_approve, 1);
}

#[tokio::test]
async fn terminal_votes_drop_out_of_the_open_list() {
    let service = service_with_three_votes();
    let query = VoteQueryService::new(&service, session());

    service.set_status(&VoteId::new("v2"), VoteStatus::Approved);
    let summaries = query.list_open_votes().await.unwrap();
    let ids: Vec<&str> = summaries.iter().map(|s| s.vote_id.as_str()).collect();
    assert_eq!(ids, ["v1", "v3"]);
}

#[tokio::test]
async fn voted_at_distinguishes_never_voted_from_voted() {
    let voter = concord_registry::ElectorIdentity {
        node_id: NodeId::new("n1"),
        node_class: NodeClass::Validator,
        status: NodeStatus::Active,
        backing_account: AccountAddress::new("cncd_n1"),
        owner: OperatorId::new("op-1"),
        display_name: None,
    };
    let secret = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
    let service = service_with_three_votes()
        .with_identity(voter.clone())
        .with_account(voter.backing_account.clone(), 100, secret);
    let session = session();

    let query = VoteQueryService::new(&service, session.clone());
    let summaries = query.list_open_votes().await.unwrap();
    assert!(summaries.iter().all(|s| !s.already_voted()));

    // cast on v1 through the protocol, then the sentinel flips
    let mut casting = concord_client::VoteCasting::new(VoteId::new("v1"), SubjectKind::NodeJoin);
    casting
        .select_identity(
            &session,
            voter.clone(),
            concord_registry::AccountRef {
                address: voter.backing_account.clone(),
                balance: 100,
            },
        )
        .unwrap();
    casting.provide_credential(secret).unwrap();
    casting
        .submit(concord_governance::DecisionChoice::Approve, &service)
        .await
        .unwrap();

    let summaries = query.list_open_votes().await.unwrap();
    let v1 = summaries.iter().find(|s| s.vote_id.as_str() == "v1").unwrap();
    assert!(v1.already_voted());
    assert_eq!(v1.voted_at, Some(Timestamp::new(NOW)));
    assert!(summaries
        .iter()
        .filter(|s| s.vote_id.as_str() != "v1")
        .all(|s| !s.already_voted()));
}

#[tokio::test]
async fn refresh_after_cast_returns_fresh_tally_and_balance() {
    let voter = concord_registry::ElectorIdentity {
        node_id: NodeId::new("n1"),
        node_class: NodeClass::FullNode,
        status: NodeStatus::Active,
        backing_account: AccountAddress::new("cncd_n1"),
        owner: OperatorId::new("op-1"),
        display_name: None,
    };
    let secret = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
    let service = service_with_three_votes()
        .with_fee(25)
        .with_identity(voter.clone())
        .with_account(voter.backing_account.clone(), 500, secret);
    let session = session();
    let v1 = VoteId::new("v1");

    let mut query = VoteQueryService::new(&service, session.clone());
    query.fetch_open_with_tallies().await.unwrap();
    assert_eq!(query.cached_tally(&v1).unwrap().fullnode_approve, 0);

    let mut casting = concord_client::VoteCasting::new(v1.clone(), SubjectKind::NodeJoin);
    casting
        .select_identity(
            &session,
            voter.clone(),
            concord_registry::AccountRef {
                address: voter.backing_account.clone(),
                balance: 500,
            },
        )
        .unwrap();
    casting.provide_credential(secret).unwrap();
    casting
        .submit(concord_governance::DecisionChoice::Approve, &service)
        .await
        .unwrap();

    let (tally, balance) = query
        .refresh_after_cast(&v1, &voter.backing_account, &service)
        .await
        .unwrap();
    assert_eq!(tally.fullnode_approve, 1);
    assert_eq!(balance, 475);
    assert_eq!(query.cached_tally(&v1).unwrap().fullnode_approve, 1);
}
