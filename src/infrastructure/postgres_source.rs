// PostgreSQL implementation of the station_metrics source
use crate::application::measurement_source::{FetchMode, MeasurementSource};
use crate::domain::measurement::{ChannelRef, SourceMeasurementRow};
use crate::domain::metric::MetricDefinition;
use crate::infrastructure::config::SourceSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

const MEASUREMENT_SELECT: &str = r#"
    SELECT
        m.id,
        m.value,
        m.starttime,
        m.endtime,
        m.created_at,
        s.net,
        s.sta,
        s.loc,
        s.chan,
        metrics.metric
    FROM measurements m
    JOIN sncls s ON s.id = m.sncl_id
    JOIN metrics ON metrics.id = m.metric_id
    WHERE UPPER(s.net) = ANY($1)
    AND metrics.metric = ANY($2)
"#;

/// Full query text for a fetch mode. Range binds `$3`/`$4`, after-id binds `$3`.
fn measurement_query(mode: &FetchMode) -> String {
    let predicate = match mode {
        FetchMode::Range { .. } => "AND m.starttime >= $3 AND m.starttime < $4",
        FetchMode::AfterId { .. } => "AND m.id > $3",
    };
    format!("{}    {}\n    ORDER BY m.id ASC", MEASUREMENT_SELECT, predicate)
}

/// The source columns are `timestamp without time zone` holding UTC
fn utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&naive)
}

fn measurement_from_row(row: &PgRow) -> Result<SourceMeasurementRow> {
    Ok(SourceMeasurementRow {
        id: row.try_get::<i64, _>("id")?,
        channel: ChannelRef::new(
            row.try_get("net")?,
            row.try_get("sta")?,
            row.try_get("loc")?,
            row.try_get("chan")?,
        ),
        metric: row.try_get("metric")?,
        value: row.try_get::<f64, _>("value")?,
        starttime: utc(row.try_get("starttime")?),
        endtime: utc(row.try_get("endtime")?),
        created_at: utc(row.try_get("created_at")?),
    })
}

/// Read-only handle on the legacy store. Holds a single connection; call
/// `close` once the run is over.
#[derive(Debug, Clone)]
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    pub async fn connect(settings: &SourceSettings) -> Result<Self> {
        let mut options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .database(&settings.name)
            .username(&settings.user);
        if let Some(password) = &settings.password {
            options = options.password(password);
        }

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "failed to connect to station_metrics at {}:{}/{}",
                    settings.host, settings.port, settings.name
                )
            })?;
        tracing::info!(host = %settings.host, database = %settings.name, "connected to station_metrics");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("station_metrics connection closed");
    }
}

#[async_trait]
impl MeasurementSource for PostgresSource {
    async fn fetch_measurements(
        &self,
        networks: &[String],
        metrics: &[String],
        mode: FetchMode,
    ) -> Result<Vec<SourceMeasurementRow>> {
        let networks: Vec<String> = networks.iter().map(|n| n.to_uppercase()).collect();
        let sql = measurement_query(&mode);

        let query = sqlx::query(&sql).bind(networks).bind(metrics.to_vec());
        let query = match mode {
            FetchMode::Range { start, end } => query.bind(start.naive_utc()).bind(end.naive_utc()),
            FetchMode::AfterId { after_id } => query.bind(after_id),
        };

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("measurement query failed")?;
        tracing::debug!(count = rows.len(), ?mode, "fetched measurements");

        rows.iter().map(measurement_from_row).collect()
    }

    async fn fetch_metric_definitions(&self) -> Result<Vec<MetricDefinition>> {
        let rows = sqlx::query(
            r#"
            SELECT metric, unit, description
            FROM metrics
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("metric definition query failed")?;

        rows.iter()
            .map(|row| -> Result<MetricDefinition> {
                Ok(MetricDefinition::new(
                    row.try_get("metric")?,
                    row.try_get("unit")?,
                    row.try_get("description")?,
                ))
            })
            .collect()
    }
}
