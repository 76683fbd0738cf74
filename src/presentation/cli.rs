// Command line interface
use crate::application::migration_service::RunConfig;
use crate::infrastructure::config::MigrationSettings;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "squac-migrate")]
#[command(about = "Migrate station_metrics data into squac", long_about = None)]
pub struct Cli {
    /// Config file (defaults to config/migrate if present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Migrate measurements, by date range or incrementally from the checkpoint
    Measurements(MeasurementArgs),
    /// Copy every metric definition into squac
    Metrics,
}

#[derive(Debug, Args)]
pub struct MeasurementArgs {
    /// Comma separated list of networks, e.g. CC,UW,UO
    #[arg(long, value_delimiter = ',', required = true)]
    pub networks: Vec<String>,

    /// Comma separated list of metric names
    #[arg(long, value_delimiter = ',', required = true)]
    pub metrics: Vec<String>,

    /// Measurements starting at or after this date (YYYY-mm-dd, UTC)
    #[arg(long, value_parser = parse_date, requires = "endtime")]
    pub starttime: Option<DateTime<Utc>>,

    /// Measurements starting before this date (YYYY-mm-dd, UTC)
    #[arg(long, value_parser = parse_date, requires = "starttime")]
    pub endtime: Option<DateTime<Utc>>,

    /// Measurements per bulk POST
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

/// `YYYY-mm-dd` at UTC midnight
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-mm-dd, got '{}': {}", value, e))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date '{}'", value))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

fn clean(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl MeasurementArgs {
    pub fn into_run_config(self, settings: &MigrationSettings) -> anyhow::Result<RunConfig> {
        let networks: Vec<String> = clean(self.networks)
            .into_iter()
            .map(|n| n.to_uppercase())
            .collect();
        let metrics = clean(self.metrics);
        if networks.is_empty() || metrics.is_empty() {
            anyhow::bail!("at least one network and one metric are required");
        }

        let window = match (self.starttime, self.endtime) {
            (Some(start), Some(end)) if end <= start => {
                anyhow::bail!("endtime {} must be after starttime {}", end, start)
            }
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        };

        Ok(RunConfig {
            networks,
            metrics,
            window,
            chunk_size: self.chunk_size.unwrap_or(settings.chunk_size),
            lookback: Duration::hours(settings.lookback_hours),
        })
    }
}
