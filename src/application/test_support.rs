// In-memory fakes for the application layer tests
use crate::application::checkpoint_store::CheckpointStore;
use crate::application::measurement_source::{FetchMode, MeasurementSource};
use crate::application::squac_api::{ApiResponse, MetricId, SquacApi};
use crate::domain::measurement::{
    ChannelKey, ChannelRef, MeasurementPayload, RowId, SourceMeasurementRow,
};
use crate::domain::metric::MetricDefinition;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap()
}

/// Row on station `sta` of network UW, one hour after `base_time() + id minutes`
pub fn row(id: RowId, sta: &str, metric: &str) -> SourceMeasurementRow {
    let start = base_time() + Duration::minutes(id);
    SourceMeasurementRow {
        id,
        channel: ChannelRef::new("UW", sta, "--", "HNZ"),
        metric: metric.to_string(),
        value: id as f64,
        starttime: start,
        endtime: start + Duration::hours(1),
        created_at: start,
    }
}

#[derive(Default)]
pub struct FakeSource {
    rows: Vec<SourceMeasurementRow>,
    metric_definitions: Vec<MetricDefinition>,
    fail: bool,
    pub requests: Mutex<Vec<FetchMode>>,
}

impl FakeSource {
    pub fn with_rows(rows: Vec<SourceMeasurementRow>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn with_metric_definitions(metric_definitions: Vec<MetricDefinition>) -> Self {
        Self {
            metric_definitions,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl MeasurementSource for FakeSource {
    async fn fetch_measurements(
        &self,
        networks: &[String],
        metrics: &[String],
        mode: FetchMode,
    ) -> anyhow::Result<Vec<SourceMeasurementRow>> {
        self.requests.lock().unwrap().push(mode);
        if self.fail {
            anyhow::bail!("connection refused");
        }

        let mut rows: Vec<SourceMeasurementRow> = self
            .rows
            .iter()
            .filter(|r| {
                networks
                    .iter()
                    .any(|n| n.eq_ignore_ascii_case(&r.channel.network))
            })
            .filter(|r| metrics.contains(&r.metric))
            .filter(|r| match mode {
                FetchMode::Range { start, end } => start <= r.starttime && r.starttime < end,
                FetchMode::AfterId { after_id } => r.id > after_id,
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn fetch_metric_definitions(&self) -> anyhow::Result<Vec<MetricDefinition>> {
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(self.metric_definitions.clone())
    }
}

#[derive(Debug, Default)]
pub struct ApiCalls {
    pub network_checks: usize,
    pub metric_lookups: usize,
    pub channel_lookups: Vec<ChannelKey>,
    pub bulk_sizes: Vec<usize>,
    pub singles: Vec<RowId>,
    pub metric_creates: Vec<String>,
}

#[derive(Default)]
pub struct FakeSquacApi {
    metrics: HashMap<String, i64>,
    channels: HashMap<ChannelKey, i64>,
    broken_channels: HashSet<ChannelKey>,
    failing_bulk_calls: HashSet<usize>,
    bulk_transport_error: bool,
    failing_singles: HashSet<RowId>,
    failing_metric_creates: HashSet<String>,
    network_status: Option<u16>,
    pub calls: Mutex<ApiCalls>,
}

impl FakeSquacApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metric(mut self, name: &str, id: i64) -> Self {
        self.metrics.insert(name.to_string(), id);
        self
    }

    /// Register station `sta` of network UW (see `row`)
    pub fn channel(mut self, sta: &str, id: i64) -> Self {
        self.channels
            .insert(ChannelRef::new("UW", sta, "--", "HNZ").key(), id);
        self
    }

    pub fn broken_channel(mut self, sta: &str) -> Self {
        self.broken_channels
            .insert(ChannelRef::new("UW", sta, "--", "HNZ").key());
        self
    }

    /// Make the bulk request with the given zero-based call index answer 400
    pub fn fail_bulk_call(mut self, index: usize) -> Self {
        self.failing_bulk_calls.insert(index);
        self
    }

    pub fn bulk_transport_error(mut self) -> Self {
        self.bulk_transport_error = true;
        self
    }

    pub fn fail_single(mut self, id: RowId) -> Self {
        self.failing_singles.insert(id);
        self
    }

    pub fn fail_metric_create(mut self, name: &str) -> Self {
        self.failing_metric_creates.insert(name.to_string());
        self
    }

    pub fn network_status(mut self, status: u16) -> Self {
        self.network_status = Some(status);
        self
    }

    pub fn calls(&self) -> std::sync::MutexGuard<'_, ApiCalls> {
        self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SquacApi for FakeSquacApi {
    async fn check_networks(&self, _networks: &[String]) -> anyhow::Result<ApiResponse> {
        self.calls().network_checks += 1;
        Ok(ApiResponse::new(self.network_status.unwrap_or(200), "[]"))
    }

    async fn lookup_metrics(&self, names: &[String]) -> anyhow::Result<Vec<MetricId>> {
        self.calls().metric_lookups += 1;
        Ok(names
            .iter()
            .filter_map(|n| {
                self.metrics.get(n).map(|id| MetricId {
                    name: n.clone(),
                    id: *id,
                })
            })
            .collect())
    }

    async fn lookup_channel(&self, channel: &ChannelRef) -> anyhow::Result<Option<i64>> {
        let key = channel.key();
        self.calls().channel_lookups.push(key.clone());
        if self.broken_channels.contains(&key) {
            anyhow::bail!("502 Bad Gateway");
        }
        Ok(self.channels.get(&key).copied())
    }

    async fn create_measurements(
        &self,
        payloads: &[MeasurementPayload],
    ) -> anyhow::Result<ApiResponse> {
        let index = {
            let mut calls = self.calls();
            calls.bulk_sizes.push(payloads.len());
            calls.bulk_sizes.len() - 1
        };
        if self.bulk_transport_error {
            anyhow::bail!("connection reset");
        }
        if self.failing_bulk_calls.contains(&index) {
            return Ok(ApiResponse::new(400, r#"[{"value":["invalid"]}]"#));
        }
        Ok(ApiResponse::new(201, "[]"))
    }

    async fn create_measurement(&self, payload: &MeasurementPayload) -> anyhow::Result<ApiResponse> {
        self.calls().singles.push(payload.source_id);
        if self.failing_singles.contains(&payload.source_id) {
            return Ok(ApiResponse::new(400, r#"{"channel":["does not exist"]}"#));
        }
        Ok(ApiResponse::new(201, "{}"))
    }

    async fn create_metric(&self, metric: &MetricDefinition) -> anyhow::Result<ApiResponse> {
        self.calls().metric_creates.push(metric.name.clone());
        if self.failing_metric_creates.contains(&metric.name) {
            return Ok(ApiResponse::new(400, r#"{"name":["already exists"]}"#));
        }
        Ok(ApiResponse::new(201, "{}"))
    }
}

#[derive(Default)]
pub struct MemoryCheckpointStore {
    value: Mutex<Option<RowId>>,
    pub saves: Mutex<Vec<RowId>>,
}

impl MemoryCheckpointStore {
    pub fn with_value(id: RowId) -> Self {
        Self {
            value: Mutex::new(Some(id)),
            ..Default::default()
        }
    }

    pub fn saved(&self) -> Vec<RowId> {
        self.saves.lock().unwrap().clone()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> anyhow::Result<Option<RowId>> {
        Ok(*self.value.lock().unwrap())
    }

    fn save(&self, id: RowId) -> anyhow::Result<()> {
        *self.value.lock().unwrap() = Some(id);
        self.saves.lock().unwrap().push(id);
        Ok(())
    }
}
