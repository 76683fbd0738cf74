// Migration service - Use case for moving station_metrics measurements into squac
use crate::application::batch_publisher::BatchPublisher;
use crate::application::checkpoint_store::CheckpointStore;
use crate::application::error::MigrationError;
use crate::application::key_translator::{KeyTranslator, TranslationCache};
use crate::application::measurement_source::{FetchMode, MeasurementSource};
use crate::application::squac_api::SquacApi;
use crate::domain::measurement::{RowId, SourceMeasurementRow};
use crate::domain::report::{DroppedRow, PublishReport, RunSummary};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Everything a single run needs to know
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Network codes, uppercased
    pub networks: Vec<String>,
    pub metrics: Vec<String>,
    /// Explicit `[start, end)` window. `None` selects checkpoint mode.
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub chunk_size: usize,
    /// Window used in checkpoint mode when no checkpoint exists yet
    pub lookback: Duration,
}

/// Pick the rows to read: explicit window, else rows after the checkpoint,
/// else the lookback window ending at `now`.
pub fn resolve_fetch_mode(
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    checkpoint: Option<RowId>,
    now: DateTime<Utc>,
    lookback: Duration,
) -> FetchMode {
    match (window, checkpoint) {
        (Some((start, end)), _) => FetchMode::Range { start, end },
        (None, Some(after_id)) => FetchMode::AfterId { after_id },
        (None, None) => FetchMode::Range {
            start: now - lookback,
            end: now,
        },
    }
}

/// Highest fetched id such that no row at or below it failed to publish.
/// Dropped rows count as settled since retrying them cannot succeed.
pub fn settled_high_water_mark(rows: &[SourceMeasurementRow], report: &PublishReport) -> Option<RowId> {
    let failed: HashSet<RowId> = report.failed.iter().map(|f| f.source_id).collect();
    rows.iter()
        .map(|r| r.id)
        .take_while(|id| !failed.contains(id))
        .last()
}

#[derive(Clone)]
pub struct MigrationService {
    source: Arc<dyn MeasurementSource>,
    api: Arc<dyn SquacApi>,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl MigrationService {
    pub fn new(
        source: Arc<dyn MeasurementSource>,
        api: Arc<dyn SquacApi>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            source,
            api,
            checkpoints,
        }
    }

    pub async fn run(
        &self,
        config: &RunConfig,
        now: DateTime<Utc>,
    ) -> Result<RunSummary, MigrationError> {
        let checkpoint_mode = config.window.is_none();
        let previous = if checkpoint_mode {
            self.checkpoints.load().map_err(MigrationError::Checkpoint)?
        } else {
            None
        };
        let mode = resolve_fetch_mode(config.window, previous, now, config.lookback);
        tracing::info!(?mode, networks = ?config.networks, metrics = ?config.metrics, "starting measurement migration");

        self.check_networks(&config.networks).await;
        let mut cache = self.load_metric_cache(&config.metrics).await?;

        let rows = self
            .source
            .fetch_measurements(&config.networks, &config.metrics, mode)
            .await
            .map_err(MigrationError::Source)?;

        let mut summary = RunSummary {
            fetched: rows.len(),
            ..Default::default()
        };
        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            tracing::info!("no new measurements, checkpoint unchanged");
            return Ok(summary);
        };
        tracing::info!(
            count = rows.len(),
            first_id = first.id,
            last_id = last.id,
            last_created_at = %last.created_at,
            "fetched measurements"
        );

        // 1. Translate
        let translator = KeyTranslator::new(self.api.clone());
        let mut payloads = Vec::with_capacity(rows.len());
        for row in &rows {
            match translator.translate(row, &mut cache).await? {
                Some(payload) => payloads.push(payload),
                None => summary.dropped.push(DroppedRow {
                    source_id: row.id,
                    channel: row.channel.key(),
                }),
            }
        }
        tracing::info!(
            fetched = summary.fetched,
            translated = payloads.len(),
            dropped = summary.dropped_count(),
            channels = cache.cached_channels(),
            "translation finished"
        );

        // 2. Publish
        let publisher = BatchPublisher::new(self.api.clone(), config.chunk_size);
        summary.report = publisher.publish(&payloads).await;

        // 3. Advance the checkpoint past everything that is settled
        if checkpoint_mode {
            match settled_high_water_mark(&rows, &summary.report) {
                Some(id) => {
                    self.checkpoints
                        .save(id)
                        .map_err(MigrationError::Checkpoint)?;
                    tracing::info!(checkpoint = id, "checkpoint saved");
                    summary.checkpoint = Some(id);
                }
                None => tracing::warn!("first row failed to publish, checkpoint unchanged"),
            }
        }

        Ok(summary)
    }

    async fn check_networks(&self, networks: &[String]) {
        let lower: Vec<String> = networks.iter().map(|n| n.to_lowercase()).collect();
        match self.api.check_networks(&lower).await {
            Ok(response) if response.is_ok() => {}
            Ok(response) => tracing::warn!(
                status = response.status,
                body = %response.body,
                "network check failed, verify squac configuration"
            ),
            Err(e) => tracing::warn!(error = %e, "network check request failed"),
        }
    }

    async fn load_metric_cache(&self, metrics: &[String]) -> Result<TranslationCache, MigrationError> {
        let ids = self
            .api
            .lookup_metrics(metrics)
            .await
            .map_err(MigrationError::MetricLookup)?;
        let cache = TranslationCache::with_metrics(ids);

        let missing = cache.missing_metrics(metrics);
        if !missing.is_empty() {
            return Err(MigrationError::MissingMetrics(missing));
        }
        Ok(cache)
    }
}
