// Key translator - Map source channel/metric references to squac ids
use crate::application::error::TranslateError;
use crate::application::squac_api::{MetricId, SquacApi};
use crate::domain::measurement::{ChannelKey, MeasurementPayload, SourceMeasurementRow};
use std::collections::HashMap;
use std::sync::Arc;

/// Run-scoped memo of squac ids.
///
/// Metric ids are filled once up front; channel ids are filled as rows are
/// translated. A channel squac does not know is stored as `None` so it is
/// never looked up twice in the same run.
#[derive(Debug, Default)]
pub struct TranslationCache {
    metrics: HashMap<String, i64>,
    channels: HashMap<ChannelKey, Option<i64>>,
}

impl TranslationCache {
    pub fn with_metrics(metrics: impl IntoIterator<Item = MetricId>) -> Self {
        Self {
            metrics: metrics.into_iter().map(|m| (m.name, m.id)).collect(),
            channels: HashMap::new(),
        }
    }

    pub fn metric_id(&self, name: &str) -> Option<i64> {
        self.metrics.get(name).copied()
    }

    /// Names from `requested` with no metric id
    pub fn missing_metrics(&self, requested: &[String]) -> Vec<String> {
        requested
            .iter()
            .filter(|name| !self.metrics.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn cached_channels(&self) -> usize {
        self.channels.len()
    }
}

#[derive(Clone)]
pub struct KeyTranslator {
    api: Arc<dyn SquacApi>,
}

impl KeyTranslator {
    pub fn new(api: Arc<dyn SquacApi>) -> Self {
        Self { api }
    }

    /// Translate a row into a payload.
    ///
    /// `Ok(None)` means the row's channel does not exist in squac and the row
    /// should be dropped.
    pub async fn translate(
        &self,
        row: &SourceMeasurementRow,
        cache: &mut TranslationCache,
    ) -> Result<Option<MeasurementPayload>, TranslateError> {
        let key = row.channel.key();

        let channel_id = match cache.channels.get(&key) {
            Some(cached) => *cached,
            None => {
                let looked_up = self
                    .api
                    .lookup_channel(&row.channel.to_lowercase())
                    .await
                    .map_err(|source| TranslateError::ChannelLookup {
                        channel: key.clone(),
                        source,
                    })?;
                if looked_up.is_none() {
                    tracing::warn!(channel = %key, "channel not found in squac");
                }
                cache.channels.insert(key.clone(), looked_up);
                looked_up
            }
        };

        let Some(channel_id) = channel_id else {
            tracing::debug!(row = row.id, channel = %key, "dropping row for unknown channel");
            return Ok(None);
        };

        let metric_id =
            cache
                .metric_id(&row.metric)
                .ok_or_else(|| TranslateError::MetricNotFound {
                    metric: row.metric.clone(),
                })?;

        Ok(Some(MeasurementPayload::new(row, channel_id, metric_id)))
    }
}
