use crate::application::batch_publisher::DEFAULT_CHUNK_SIZE;
use anyhow::Context;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "config/migrate";

#[derive(Debug, Deserialize, Clone)]
pub struct MigrateConfig {
    pub source: SourceSettings,
    pub squac: SquacSettings,
    pub checkpoint: CheckpointSettings,
    pub migration: MigrationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SquacSettings {
    pub base_url: String,
    pub token: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CheckpointSettings {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MigrationSettings {
    pub chunk_size: usize,
    pub lookback_hours: i64,
}

/// Environment variables the legacy migration scripts read, mapped onto config keys
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DB_HOST", "source.host"),
    ("DB_PORT", "source.port"),
    ("DB_NAME", "source.name"),
    ("DB_USER", "source.user"),
    ("DB_PASSWD", "source.password"),
    ("SQUAC_API_BASE", "squac.base_url"),
    ("SQUAC_API_TOKEN", "squac.token"),
    ("MIGRATE_CHECKPOINT_PATH", "checkpoint.path"),
];

fn with_defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    Ok(config::Config::builder()
        .set_default("source.host", "localhost")?
        .set_default("source.port", 5432)?
        .set_default("source.user", "postgres")?
        .set_default("squac.base_url", "https://squacapi.pnsn.org")?
        .set_default("squac.request_timeout_secs", 30)?
        .set_default("checkpoint.path", "state/last_measurement_id")?
        .set_default("migration.chunk_size", DEFAULT_CHUNK_SIZE as i64)?
        .set_default("migration.lookback_hours", 24)?)
}

fn apply_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ConfigBuilder<DefaultState>> {
    for (var, key) in ENV_OVERRIDES {
        let value = lookup(var).filter(|v| !v.trim().is_empty());
        builder = builder.set_override_option(*key, value)?;
    }
    Ok(builder)
}

/// Load defaults, then `config/migrate` (or `path`) if present, then the legacy env vars
pub fn load_migrate_config(path: Option<&str>) -> anyhow::Result<MigrateConfig> {
    let file = config::File::with_name(path.unwrap_or(DEFAULT_CONFIG_FILE)).required(path.is_some());
    let builder = apply_env_overrides(with_defaults()?.add_source(file), |var| std::env::var(var).ok())?;

    builder
        .build()?
        .try_deserialize()
        .context("incomplete configuration (DB_NAME and SQUAC_API_TOKEN are required)")
}
