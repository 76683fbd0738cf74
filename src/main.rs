// Main entry point - Dependency injection and job dispatch
mod application;
mod domain;
mod infrastructure;
mod presentation;

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::application::metric_migration_service::MetricMigrationService;
use crate::application::migration_service::{MigrationService, RunConfig};
use crate::infrastructure::config::{load_migrate_config, MigrateConfig};
use crate::infrastructure::file_checkpoint::FileCheckpointStore;
use crate::infrastructure::postgres_source::PostgresSource;
use crate::infrastructure::squac_client::SquacClient;
use crate::presentation::cli::{Cli, Command};

enum Job {
    Measurements(RunConfig),
    Metrics,
}

// Everything runs on one thread, one awaited call at a time
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_migrate_config(cli.config.as_deref())?;

    // Validate arguments before touching any external system
    let job = match cli.command {
        Command::Measurements(args) => Job::Measurements(args.into_run_config(&config.migration)?),
        Command::Metrics => Job::Metrics,
    };

    let api = Arc::new(SquacClient::new(
        config.squac.base_url.clone(),
        config.squac.token.clone(),
        Duration::from_secs(config.squac.request_timeout_secs),
    )?);
    let source = Arc::new(PostgresSource::connect(&config.source).await?);

    let result = run_job(job, &config, source.clone(), api).await;

    // Released on success and failure alike
    source.close().await;
    result
}

async fn run_job(
    job: Job,
    config: &MigrateConfig,
    source: Arc<PostgresSource>,
    api: Arc<SquacClient>,
) -> anyhow::Result<()> {
    match job {
        Job::Measurements(run_config) => {
            let checkpoints = Arc::new(FileCheckpointStore::new(config.checkpoint.path.clone()));
            tracing::debug!(path = %checkpoints.path().display(), "using checkpoint file");
            let service = MigrationService::new(source, api, checkpoints);
            let summary = service.run(&run_config, chrono::Utc::now()).await?;

            tracing::info!(
                fetched = summary.fetched,
                published = summary.report.published_count(),
                failed = summary.report.failed_count(),
                dropped = summary.dropped_count(),
                checkpoint = ?summary.checkpoint,
                "measurement migration finished"
            );
            for failure in &summary.report.failed {
                tracing::warn!(row = failure.source_id, reason = %failure.reason, "measurement not migrated");
            }
        }
        Job::Metrics => {
            let report = MetricMigrationService::new(source, api).migrate().await?;
            tracing::info!(
                created = report.created.len(),
                failed = report.failed.len(),
                "metric migration finished"
            );
        }
    }
    Ok(())
}
