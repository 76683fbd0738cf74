// Measurement domain models - source rows and translated payloads
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Identifier of a row in the source `measurements` table
pub type RowId = i64;

/// Four-part sensor channel reference as stored in the source `sncls` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
}

impl ChannelRef {
    pub fn new(network: &str, station: &str, location: &str, channel: &str) -> Self {
        Self {
            network: network.to_string(),
            station: station.to_string(),
            location: location.to_string(),
            channel: channel.to_string(),
        }
    }

    /// Lowercased copy, the form squac expects in channel queries
    pub fn to_lowercase(&self) -> Self {
        Self {
            network: self.network.to_lowercase(),
            station: self.station.to_lowercase(),
            location: self.location.to_lowercase(),
            channel: self.channel.to_lowercase(),
        }
    }

    pub fn key(&self) -> ChannelKey {
        ChannelKey::from(self)
    }
}

/// Cache key for a channel: lowercased `net_sta_loc_chan`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey(String);

impl From<&ChannelRef> for ChannelKey {
    fn from(channel: &ChannelRef) -> Self {
        let lower = channel.to_lowercase();
        Self(format!(
            "{}_{}_{}_{}",
            lower.network, lower.station, lower.location, lower.channel
        ))
    }
}

impl ChannelKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceMeasurementRow {
    pub id: RowId,
    pub channel: ChannelRef,
    pub metric: String,
    pub value: f64,
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A measurement ready to be posted to squac.
///
/// `source_id` stays in memory so publish outcomes can be tied back to the
/// source row; it is never sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementPayload {
    #[serde(skip)]
    pub source_id: RowId,
    #[serde(rename = "channel")]
    pub channel_id: i64,
    #[serde(rename = "metric")]
    pub metric_id: i64,
    pub value: f64,
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
}

impl MeasurementPayload {
    pub fn new(row: &SourceMeasurementRow, channel_id: i64, metric_id: i64) -> Self {
        Self {
            source_id: row.id,
            channel_id,
            metric_id,
            value: row.value,
            starttime: row.starttime,
            endtime: row.endtime,
        }
    }
}
