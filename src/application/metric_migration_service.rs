// Metric migration service - Copy metric definitions into squac
use crate::application::error::MigrationError;
use crate::application::measurement_source::MeasurementSource;
use crate::application::squac_api::SquacApi;
use crate::domain::metric::MetricMigrationReport;
use std::sync::Arc;

#[derive(Clone)]
pub struct MetricMigrationService {
    source: Arc<dyn MeasurementSource>,
    api: Arc<dyn SquacApi>,
}

impl MetricMigrationService {
    pub fn new(source: Arc<dyn MeasurementSource>, api: Arc<dyn SquacApi>) -> Self {
        Self { source, api }
    }

    /// Post every source metric definition. Rejected metrics are reported, not fatal.
    pub async fn migrate(&self) -> Result<MetricMigrationReport, MigrationError> {
        let definitions = self
            .source
            .fetch_metric_definitions()
            .await
            .map_err(MigrationError::Source)?;
        tracing::info!(count = definitions.len(), "migrating metric definitions");

        let mut report = MetricMigrationReport::default();
        for definition in &definitions {
            let reason = match self.api.create_metric(definition).await {
                Ok(response) if response.is_created() => {
                    report.created.push(definition.name.clone());
                    continue;
                }
                Ok(response) => format!("HTTP {}: {}", response.status, response.body),
                Err(e) => e.to_string(),
            };
            tracing::error!(metric = %definition.name, reason = %reason, "metric create failed");
            report.failed.push((definition.name.clone(), reason));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{FakeSource, FakeSquacApi};
    use crate::domain::metric::MetricDefinition;

    fn definition(name: &str) -> MetricDefinition {
        MetricDefinition::new(name.to_string(), "count".to_string(), format!("{} metric", name))
    }

    #[tokio::test]
    async fn test_failed_create_does_not_stop_the_rest() {
        let source = FakeSource::with_metric_definitions(vec![
            definition("ngaps"),
            definition("pctavailable"),
            definition("snr20_0p34cmHP"),
        ]);
        let api = Arc::new(FakeSquacApi::new().fail_metric_create("pctavailable"));
        let service = MetricMigrationService::new(Arc::new(source), api.clone());

        let report = service.migrate().await.unwrap();

        assert_eq!(api.calls().metric_creates.len(), 3);
        assert_eq!(report.created, vec!["ngaps".to_string(), "snr20_0p34cmHP".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "pctavailable");
        assert!(report.failed[0].1.contains("already exists"));
    }

    #[tokio::test]
    async fn test_source_failure_is_fatal() {
        let service =
            MetricMigrationService::new(Arc::new(FakeSource::failing()), Arc::new(FakeSquacApi::new()));
        assert!(matches!(service.migrate().await, Err(MigrationError::Source(_))));
    }
}
