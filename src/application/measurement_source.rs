// Repository trait for reading the legacy station_metrics store
use crate::domain::measurement::{RowId, SourceMeasurementRow};
use crate::domain::metric::MetricDefinition;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Row selection predicate for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Rows with `start <= starttime < end`
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Rows with `id > after_id`
    AfterId { after_id: RowId },
}

#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// Fetch measurements for the given networks and metric names, ordered by ascending id
    async fn fetch_measurements(
        &self,
        networks: &[String],
        metrics: &[String],
        mode: FetchMode,
    ) -> anyhow::Result<Vec<SourceMeasurementRow>>;

    /// Every metric definition in the source store
    async fn fetch_metric_definitions(&self) -> anyhow::Result<Vec<MetricDefinition>>;
}
