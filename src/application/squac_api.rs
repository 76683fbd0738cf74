// Gateway trait for the squac REST API
use crate::domain::measurement::{ChannelRef, MeasurementPayload};
use crate::domain::metric::MetricDefinition;
use async_trait::async_trait;

/// Status and raw body of a squac response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_created(&self) -> bool {
        self.status == 201
    }
}

/// `{name, id}` pair returned by the metric lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricId {
    pub name: String,
    pub id: i64,
}

#[async_trait]
pub trait SquacApi: Send + Sync {
    /// Look up networks by (lowercase) code
    async fn check_networks(&self, networks: &[String]) -> anyhow::Result<ApiResponse>;

    /// Resolve metric names to ids in a single request
    async fn lookup_metrics(&self, names: &[String]) -> anyhow::Result<Vec<MetricId>>;

    /// Resolve a channel to its id; `None` when squac has no such channel
    async fn lookup_channel(&self, channel: &ChannelRef) -> anyhow::Result<Option<i64>>;

    /// Bulk create measurements
    async fn create_measurements(&self, payloads: &[MeasurementPayload])
        -> anyhow::Result<ApiResponse>;

    /// Create a single measurement
    async fn create_measurement(&self, payload: &MeasurementPayload) -> anyhow::Result<ApiResponse>;

    async fn create_metric(&self, metric: &MetricDefinition) -> anyhow::Result<ApiResponse>;
}
