//! Concord governance console — the operator dashboard, in a terminal.
//!
//! Lists open governance votes with per-class progress, shows full tallies,
//! and drives the vote-casting protocol end to end against a gateway.

mod config;

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;

use concord_client::{
    ensure_eligible, CastError, CastingState, GatewayClient, OperatorSession, VoteCasting,
    VoteQueryService,
};
use concord_governance::{time_remaining, DecisionChoice, VoteStatus};
use concord_registry::ElectorRegistry;
use concord_types::{NodeId, OperatorId, Timestamp, VoteId};
use config::ConsoleConfig;

#[derive(Parser)]
#[command(name = "concord-console", about = "Concord governance voting console")]
struct Cli {
    /// Gateway base URL. When a config file is provided, defaults to the
    /// file's value.
    #[arg(long, env = "CONCORD_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Operator identity to act as.
    #[arg(long, env = "CONCORD_OPERATOR_ID")]
    operator: Option<String>,

    /// Maximum concurrent tally fetches during a listing refresh.
    #[arg(long, env = "CONCORD_MAX_IN_FLIGHT")]
    max_in_flight: Option<usize>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "CONCORD_LOG_LEVEL")]
    log_level: String,

    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Governance votes.
    #[command(name = "votes")]
    Votes {
        #[command(subcommand)]
        action: VotesAction,
    },
}

#[derive(clap::Subcommand)]
enum VotesAction {
    /// List open votes with progress and remaining window.
    List,
    /// Show the full tally for one vote.
    Show { vote_id: String },
    /// Cast a decision on one vote.
    Cast {
        vote_id: String,

        /// Node identity to vote with.
        #[arg(long)]
        node: String,

        /// Approve the proposal.
        #[arg(long, conflicts_with = "reject")]
        approve: bool,

        /// Reject the proposal.
        #[arg(long)]
        reject: bool,

        /// Backing-account secret (64 hex characters).
        #[arg(long, env = "CONCORD_VOTE_SECRET", hide_env_values = true)]
        secret: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config: Option<ConsoleConfig> = if let Some(ref config_path) = cli.config {
        match ConsoleConfig::from_toml_file(config_path) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                eprintln!(
                    "failed to load config file {}: {e}, using CLI defaults",
                    config_path.display()
                );
                None
            }
        }
    } else {
        None
    };

    let file_config = file_config.unwrap_or_default();
    let config = ConsoleConfig {
        gateway_url: cli.gateway_url.unwrap_or(file_config.gateway_url),
        operator_id: cli.operator.or(file_config.operator_id),
        max_in_flight: cli.max_in_flight.unwrap_or(file_config.max_in_flight),
        log_level: cli.log_level,
    };

    concord_utils::init_tracing(&config.log_level);
    tracing::debug!(gateway = %config.gateway_url, "console starting");

    let operator = OperatorId::new(
        config
            .operator_id
            .clone()
            .context("no operator id: pass --operator or set operator_id in the config file")?,
    );
    let gateway = GatewayClient::new(config.gateway_url.clone())?;
    let session = OperatorSession::new(operator);
    let mut query = VoteQueryService::new(gateway.clone(), session.clone())
        .with_max_in_flight(config.max_in_flight);

    match cli.command {
        Command::Votes { action } => match action {
            VotesAction::List => list_votes(&mut query).await,
            VotesAction::Show { vote_id } => show_tally(&mut query, &vote_id).await,
            VotesAction::Cast {
                vote_id,
                node,
                approve,
                reject,
                secret,
            } => {
                if !approve && !reject {
                    bail!("pass exactly one of --approve or --reject");
                }
                let choice = if approve {
                    DecisionChoice::Approve
                } else {
                    DecisionChoice::Reject
                };
                cast_decision(&gateway, &session, &mut query, &vote_id, &node, choice, &secret)
                    .await
            }
        },
    }
}

fn render_status(status: VoteStatus) -> &'static str {
    match status {
        VoteStatus::Pending => "pending",
        VoteStatus::Approved => "approved",
        VoteStatus::Rejected => "rejected",
        VoteStatus::Expired => "expired",
    }
}

async fn list_votes(query: &mut VoteQueryService<GatewayClient>) -> anyhow::Result<()> {
    let now = Timestamp::now();
    let open = query.fetch_open_with_tallies().await?;
    if open.is_empty() {
        println!("no open votes");
        return Ok(());
    }

    for vote in open {
        let summary = &vote.summary;
        let window = summary.submitted_at.elapsed_since(summary.expires_at);
        let left = time_remaining(summary.submitted_at, window, now);
        let remaining = if left.expired {
            "window closed".to_string()
        } else {
            concord_utils::format_duration(left.as_secs())
        };
        let voted = if summary.already_voted() { " [voted]" } else { "" };

        match &vote.tally {
            Some(tally) => println!(
                "{}  {}  {}  validators {}% ({}/{})  full nodes {}% ({}/{})  {}{}",
                summary.vote_id,
                summary.kind,
                render_status(tally.effective_status(now)),
                tally.validator_progress(),
                tally.class_counts(concord_types::NodeClass::Validator).decided(),
                tally.total_validators,
                tally.fullnode_progress(),
                tally.class_counts(concord_types::NodeClass::FullNode).decided(),
                tally.total_fullnodes,
                remaining,
                voted,
            ),
            None => println!(
                "{}  {}  tally unavailable  {}{}",
                summary.vote_id, summary.kind, remaining, voted,
            ),
        }
    }
    Ok(())
}

async fn show_tally(
    query: &mut VoteQueryService<GatewayClient>,
    vote_id: &str,
) -> anyhow::Result<()> {
    let now = Timestamp::now();
    let vote_id = VoteId::new(vote_id);
    let tally = query.tally(&vote_id).await?;

    println!("vote      {}", tally.vote_id);
    println!("status    {}", render_status(tally.effective_status(now)));
    println!(
        "validators  {:>3}% approve  ({} approve / {} reject / {} total)",
        tally.validator_progress(),
        tally.validator_approve,
        tally.validator_reject,
        tally.total_validators,
    );
    println!(
        "full nodes  {:>3}% approve  ({} approve / {} reject / {} total)",
        tally.fullnode_progress(),
        tally.fullnode_approve,
        tally.fullnode_reject,
        tally.total_fullnodes,
    );
    let window = tally.submitted_at.elapsed_since(tally.expires_at);
    let left = time_remaining(tally.submitted_at, window, now);
    if left.expired {
        println!("window    closed");
    } else {
        println!(
            "window    {}d {}h {}m remaining",
            left.days, left.hours, left.minutes
        );
    }
    Ok(())
}

async fn cast_decision(
    gateway: &GatewayClient,
    session: &OperatorSession,
    query: &mut VoteQueryService<GatewayClient>,
    vote_id: &str,
    node: &str,
    choice: DecisionChoice,
    secret: &str,
) -> anyhow::Result<()> {
    let vote_id = VoteId::new(vote_id);
    let node_id = NodeId::new(node);

    let summaries = query.list_open_votes().await?;
    let summary = summaries
        .iter()
        .find(|s| s.vote_id == vote_id)
        .with_context(|| format!("vote {vote_id} is not open"))?;

    let registry = ElectorRegistry::new(gateway.clone());
    let identities = registry
        .list_controlled_identities(session.operator())
        .await?;
    ensure_eligible(summary.kind, &identities)?;
    let identity = identities
        .into_iter()
        .find(|identity| identity.node_id == node_id)
        .with_context(|| format!("node {node_id} is not controlled by this operator"))?;
    let backing = registry.resolve_backing_account(&identity).await?;
    let backing_address = backing.address.clone();

    let mut casting = VoteCasting::new(vote_id.clone(), summary.kind);
    casting.select_identity(session, identity, backing)?;
    casting.provide_credential(secret)?;

    if let Err(err) = casting.submit(choice, gateway).await {
        if casting.state() == CastingState::Unconfirmed {
            // outcome unknown: ask the authority whether the decision landed
            // before anything else happens
            let landed = casting.reconcile(gateway).await?;
            if !landed {
                bail!("submission did not land ({err}); re-run to retry");
            }
        } else {
            return Err(describe_rejection(err));
        }
    }

    let (tally, balance) = query
        .refresh_after_cast(&vote_id, &backing_address, gateway)
        .await?;
    println!(
        "decision recorded: {} on {} (validators {}%, full nodes {}%)",
        choice,
        vote_id,
        tally.validator_progress(),
        tally.fullnode_progress(),
    );
    println!("backing account {backing_address} balance: {balance}");
    Ok(())
}

fn describe_rejection(err: CastError) -> anyhow::Error {
    let hint = match &err {
        CastError::Unauthorized => "check the secret and retry",
        CastError::DuplicateDecision(_) => "this identity has already voted; nothing to retry",
        CastError::VoteClosed => "the voting window is over",
        CastError::IneligibleIdentity(_) => "reactivate the node before voting",
        CastError::NoEligibleIdentity => "no active identity of the required class",
        _ => return err.into(),
    };
    anyhow::Error::from(err).context(hint.to_string())
}
