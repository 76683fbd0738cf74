// Outcome reports for publish and migration runs
use super::measurement::{ChannelKey, RowId};

#[derive(Debug, Clone, PartialEq)]
pub struct FailedItem {
    pub source_id: RowId,
    pub reason: String,
}

/// Result of pushing a sequence of payloads to squac
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishReport {
    pub published: Vec<RowId>,
    pub failed: Vec<FailedItem>,
    pub bulk_requests: usize,
    pub single_requests: usize,
}

impl PublishReport {
    pub fn published_count(&self) -> usize {
        self.published.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Source row skipped because its channel does not exist in squac
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRow {
    pub source_id: RowId,
    pub channel: ChannelKey,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub fetched: usize,
    pub dropped: Vec<DroppedRow>,
    pub report: PublishReport,
    /// Checkpoint written at the end of the run, if any
    pub checkpoint: Option<RowId>,
}

impl RunSummary {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}
