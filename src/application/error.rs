// Error taxonomy for a migration run
use crate::domain::measurement::ChannelKey;
use thiserror::Error;

/// Failure translating a single source row
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("metric '{metric}' is not present in squac")]
    MetricNotFound { metric: String },

    #[error("channel lookup for {channel} failed: {source}")]
    ChannelLookup {
        channel: ChannelKey,
        #[source]
        source: anyhow::Error,
    },
}

/// Run-aborting failures. The checkpoint is never written when one of these is returned.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("source store query failed: {0}")]
    Source(#[source] anyhow::Error),

    #[error("metric lookup failed: {0}")]
    MetricLookup(#[source] anyhow::Error),

    #[error("metrics missing from squac: {}", .0.join(", "))]
    MissingMetrics(Vec<String>),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("checkpoint store failed: {0}")]
    Checkpoint(#[source] anyhow::Error),
}
