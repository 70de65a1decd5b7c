//! Finds proposals that were accepted without the rest of the cascade landing
//! (no contract, siblings still submitted, project not promoted) and replays
//! the cascade for each one.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use gb_common::db::{create_pool_from_url, run_migrations, PgStore};
use gb_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use gb_common::service::{Gateway, ProposalLifecycle};
use gb_common::MarketError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(
    name = "gb-acceptance-repair",
    about = "Complete acceptance cascades left half-written"
)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Maximum number of proposals to examine in one run
    #[arg(long, default_value_t = 100)]
    limit: i64,

    /// List what would be repaired without writing
    #[arg(long)]
    dry_run: bool,

    /// Deadline (ms) for each store call
    #[arg(long, env = "GB_STORE_TIMEOUT_MS", default_value_t = 15_000)]
    store_timeout_ms: u64,
}

#[derive(Debug, Error)]
enum RepairError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("database setup failed: {0}")]
    Setup(String),
    #[error(transparent)]
    Market(#[from] MarketError),
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct RepairReport {
    examined: usize,
    contracts_created: usize,
    proposals_rejected: u64,
    projects_promoted: usize,
    failed: Vec<Uuid>,
    dry_run: bool,
}

/// Reconcile up to `limit` accepted proposals that lack a contract.
/// A failure on one proposal is recorded and the run continues.
async fn repair(
    lifecycle: &ProposalLifecycle,
    limit: i64,
    dry_run: bool,
) -> Result<RepairReport, MarketError> {
    let pending = lifecycle.pending_repairs(limit).await?;
    let mut report = RepairReport {
        examined: pending.len(),
        dry_run,
        ..Default::default()
    };

    for proposal in pending {
        if dry_run {
            info!(
                proposal_id = %proposal.id,
                project_id = proposal.project_id,
                "would_repair"
            );
            continue;
        }

        match lifecycle.reconcile_acceptance(proposal.id).await {
            Ok(outcome) => {
                report.contracts_created += usize::from(outcome.contract_created);
                report.projects_promoted += usize::from(outcome.project_promoted);
                report.proposals_rejected += outcome.rejected;
                info!(
                    proposal_id = %proposal.id,
                    contract_id = %outcome.contract.id,
                    created = outcome.contract_created,
                    rejected = outcome.rejected,
                    "acceptance_repaired"
                );
            }
            Err(err) if err.is_retryable() => return Err(err),
            Err(err) => {
                warn!(proposal_id = %proposal.id, error = %err, "acceptance_repair_failed");
                report.failed.push(proposal.id);
            }
        }
    }

    Ok(report)
}

async fn run() -> Result<RepairReport, RepairError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    if !(1..=10_000).contains(&cli.limit) {
        return Err(RepairError::InvalidArgs(
            "--limit must be between 1 and 10000".into(),
        ));
    }
    if cli.store_timeout_ms == 0 {
        return Err(RepairError::InvalidArgs(
            "GB_STORE_TIMEOUT_MS must be positive".into(),
        ));
    }

    let pool = create_pool_from_url(&cli.database_url)
        .map_err(|err| RepairError::Setup(err.to_string()))?;
    run_migrations(&pool)
        .await
        .map_err(|err| RepairError::Setup(err.to_string()))?;
    gb_metrics::init_metrics("GB_METRICS_PORT", 9465);

    let gateway = Gateway::new(
        Arc::new(PgStore::new(pool)),
        Duration::from_millis(cli.store_timeout_ms),
    );
    let lifecycle = ProposalLifecycle::new(gateway);

    Ok(repair(&lifecycle, cli.limit, cli.dry_run).await?)
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(report) => {
            info!(
                examined = report.examined,
                contracts_created = report.contracts_created,
                failed = report.failed.len(),
                "acceptance repair finished"
            );
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(err) => error!(error = %err, "failed to render report"),
            }
            if !report.failed.is_empty() {
                std::process::exit(2);
            }
        }
        Err(err) => {
            error!(error = %err, "gb-acceptance-repair failed");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use gb_common::model::{
        NewProject, NewProposal, ProjectStatus, Proposal, ProposalStatus, Requester,
    };
    use gb_common::store::{MarketStore, MemoryStore};

    use super::*;

    struct Setup {
        store: Arc<MemoryStore>,
        lifecycle: ProposalLifecycle,
    }

    impl Setup {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let lifecycle = ProposalLifecycle::new(Gateway::with_default_deadline(store.clone()));
            Self { store, lifecycle }
        }

        /// A project with two bids where the first was flipped to accepted
        /// without the cascade.
        async fn half_accepted(&self) -> (Proposal, Proposal) {
            let project = self
                .store
                .insert_project(NewProject {
                    owner_id: Uuid::new_v4(),
                    title: "Inventory sync".into(),
                    currency: Some("EUR".into()),
                    ..Default::default()
                })
                .await
                .unwrap();

            let mut bids = Vec::new();
            for amount in [1_200, 900] {
                let proposal = self
                    .store
                    .insert_proposal(NewProposal {
                        project_id: project.id,
                        freelancer_id: Uuid::new_v4(),
                        bid_amount: amount,
                        timeline: "1 month".into(),
                        cover_letter: "Available now".into(),
                    })
                    .await
                    .unwrap();
                bids.push(proposal);
            }
            let sibling = bids.pop().unwrap();
            let winner = bids.pop().unwrap();
            assert!(self
                .store
                .force_proposal_status(winner.id, ProposalStatus::Accepted));
            (winner, sibling)
        }
    }

    #[tokio::test]
    async fn repairs_half_written_acceptances() {
        let setup = Setup::new();
        let (winner, sibling) = setup.half_accepted().await;

        let report = repair(&setup.lifecycle, 10, false).await.unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.contracts_created, 1);
        assert_eq!(report.proposals_rejected, 1);
        assert_eq!(report.projects_promoted, 1);
        assert!(report.failed.is_empty());

        let contract = setup
            .store
            .get_contract_by_proposal(winner.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contract.budget_amount, 1_200);

        let sibling = setup.store.get_proposal(sibling.id).await.unwrap().unwrap();
        assert_eq!(sibling.status, ProposalStatus::Rejected);
        let project = setup
            .store
            .get_project(winner.project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.status, ProjectStatus::InProgress);

        let second = repair(&setup.lifecycle, 10, false).await.unwrap();
        assert_eq!(second, RepairReport::default());
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let setup = Setup::new();
        let (winner, _) = setup.half_accepted().await;

        let report = repair(&setup.lifecycle, 10, true).await.unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.contracts_created, 0);
        assert!(setup
            .store
            .get_contract_by_proposal(winner.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn completed_acceptances_are_not_pending() {
        let setup = Setup::new();
        let (winner, _) = setup.half_accepted().await;
        let project = setup
            .store
            .get_project(winner.project_id)
            .await
            .unwrap()
            .unwrap();

        setup.store.force_proposal_status(winner.id, ProposalStatus::Submitted);
        setup
            .lifecycle
            .accept_proposal(&Requester::User(project.owner_id), winner.id)
            .await
            .unwrap();

        let report = repair(&setup.lifecycle, 10, false).await.unwrap();
        assert_eq!(report.examined, 0);
    }

    #[tokio::test]
    async fn outage_aborts_the_run() {
        let setup = Setup::new();
        setup.half_accepted().await;
        setup.store.set_offline(true);

        let err = repair(&setup.lifecycle, 10, false).await.unwrap_err();
        assert!(matches!(err, MarketError::Dependency(_)));
    }
}
