//! Engine types
//!
//! Results and statistics of sync runs.

use crate::partition::PartitionContext;

/// Result of one stream-partition run
#[derive(Debug, Clone, Default)]
pub struct PartitionOutcome {
    /// Records that passed post-processing
    pub records: usize,
    /// Contexts for child streams, one per record, in record order
    pub child_contexts: Vec<PartitionContext>,
    /// Pages fetched
    pub pages: u32,
    /// Whether the run ended because a record reached the cutoff
    pub stopped_early: bool,
    /// Largest replication value among emitted records
    pub max_replication_value: Option<String>,
}

impl PartitionOutcome {
    /// Track a replication value, keeping the largest (string order)
    pub fn observe_replication_value(&mut self, value: &str) {
        if self
            .max_replication_value
            .as_deref()
            .is_none_or(|current| value > current)
        {
            self.max_replication_value = Some(value.to_string());
        }
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Total streams synced
    pub streams_synced: usize,
    /// Total partitions synced
    pub partitions_synced: usize,
    /// Partitions that ended at the replication cutoff
    pub early_stops: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add a partition
    pub fn add_partition(&mut self) {
        self.partitions_synced += 1;
    }

    /// Add an early stop
    pub fn add_early_stop(&mut self) {
        self.early_stops += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
