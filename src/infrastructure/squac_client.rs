// squac REST API client
use crate::application::squac_api::{ApiResponse, MetricId, SquacApi};
use crate::domain::measurement::{ChannelRef, MeasurementPayload};
use crate::domain::metric::MetricDefinition;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NETWORKS_PATH: &str = "/v1.0/nslc/networks/";
const CHANNELS_PATH: &str = "/v1.0/nslc/channels/";
const METRICS_PATH: &str = "/v1.0/measurement/metrics/";
const MEASUREMENTS_PATH: &str = "/v1.0/measurement/measurements/";

#[derive(Debug, Clone)]
pub struct SquacClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct MetricRecord {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChannelRecord {
    id: i64,
}

impl SquacClient {
    pub fn new(base_url: String, token: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query.join("&"))
        }
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<ApiResponse> {
        let url = self.build_url(path, params);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to squac: GET {}", path))?;
        Self::into_api_response(response).await
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let response = self.get(path, params).await?;
        if !response.is_ok() {
            anyhow::bail!(
                "squac GET {} failed with status {}: {}",
                path,
                response.status,
                response.body
            );
        }
        serde_json::from_str(&response.body)
            .with_context(|| format!("Failed to parse squac response for {}", path))
    }

    async fn post<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        let url = self.build_url(path, &[]);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to squac: POST {}", path))?;
        Self::into_api_response(response).await
    }

    async fn into_api_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("Failed to read squac response body")?;
        Ok(ApiResponse::new(status, body))
    }
}

#[async_trait]
impl SquacApi for SquacClient {
    async fn check_networks(&self, networks: &[String]) -> Result<ApiResponse> {
        let joined = networks.join(",");
        self.get(NETWORKS_PATH, &[("network", joined.as_str())]).await
    }

    async fn lookup_metrics(&self, names: &[String]) -> Result<Vec<MetricId>> {
        let joined = names.join(",");
        let records: Vec<MetricRecord> = self.get_list(METRICS_PATH, &[("name", joined.as_str())]).await?;
        Ok(records
            .into_iter()
            .map(|r| MetricId {
                name: r.name,
                id: r.id,
            })
            .collect())
    }

    async fn lookup_channel(&self, channel: &ChannelRef) -> Result<Option<i64>> {
        let records: Vec<ChannelRecord> = self
            .get_list(
                CHANNELS_PATH,
                &[
                    ("network", channel.network.as_str()),
                    ("station", channel.station.as_str()),
                    ("location", channel.location.as_str()),
                    ("channel", channel.channel.as_str()),
                ],
            )
            .await?;
        Ok(records.first().map(|r| r.id))
    }

    async fn create_measurements(&self, payloads: &[MeasurementPayload]) -> Result<ApiResponse> {
        self.post(MEASUREMENTS_PATH, payloads).await
    }

    async fn create_measurement(&self, payload: &MeasurementPayload) -> Result<ApiResponse> {
        self.post(MEASUREMENTS_PATH, payload).await
    }

    async fn create_metric(&self, metric: &MetricDefinition) -> Result<ApiResponse> {
        self.post(METRICS_PATH, metric).await
    }
}
