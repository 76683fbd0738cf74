// Batch publisher - Chunked measurement POSTs with per-item fallback
use crate::application::squac_api::{ApiResponse, SquacApi};
use crate::domain::measurement::MeasurementPayload;
use crate::domain::report::{FailedItem, PublishReport};
use std::sync::Arc;

pub const DEFAULT_CHUNK_SIZE: usize = 100;

#[derive(Clone)]
pub struct BatchPublisher {
    api: Arc<dyn SquacApi>,
    chunk_size: usize,
}

impl BatchPublisher {
    pub fn new(api: Arc<dyn SquacApi>, chunk_size: usize) -> Self {
        Self {
            api,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Publish payloads in order. Never fails: every item ends up in the report
    /// as either published or failed.
    pub async fn publish(&self, payloads: &[MeasurementPayload]) -> PublishReport {
        let mut report = PublishReport::default();

        for (index, chunk) in payloads.chunks(self.chunk_size).enumerate() {
            report.bulk_requests += 1;
            match self.api.create_measurements(chunk).await {
                Ok(response) if response.is_created() => {
                    report.published.extend(chunk.iter().map(|p| p.source_id));
                    tracing::debug!(chunk = index, items = chunk.len(), "bulk post created");
                }
                Ok(response) => {
                    tracing::warn!(
                        chunk = index,
                        status = response.status,
                        body = %response.body,
                        "bulk post rejected, trying single posts"
                    );
                    self.publish_singly(chunk, &mut report).await;
                }
                Err(e) => {
                    tracing::warn!(
                        chunk = index,
                        error = %e,
                        "bulk post failed, trying single posts"
                    );
                    self.publish_singly(chunk, &mut report).await;
                }
            }
        }

        tracing::info!(
            published = report.published_count(),
            failed = report.failed_count(),
            bulk_requests = report.bulk_requests,
            single_requests = report.single_requests,
            "publish finished"
        );
        report
    }

    async fn publish_singly(&self, chunk: &[MeasurementPayload], report: &mut PublishReport) {
        for payload in chunk {
            report.single_requests += 1;
            let reason = match self.api.create_measurement(payload).await {
                Ok(response) if response.is_created() => {
                    report.published.push(payload.source_id);
                    continue;
                }
                Ok(ApiResponse { status, body }) => format!("HTTP {}: {}", status, body),
                Err(e) => e.to_string(),
            };

            tracing::error!(row = payload.source_id, reason = %reason, "single post failed");
            report.failed.push(FailedItem {
                source_id: payload.source_id,
                reason,
            });
        }
    }
}
