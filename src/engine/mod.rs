//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Runs the pagination loop of each stream partition
//! - `PartitionOutcome` - Record count, child contexts and bookmark of one run
//! - `SyncStats` - Counters over the whole sync

mod types;

pub use types::{PartitionOutcome, SyncStats};

use crate::config::TapConfig;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::output::{Message, MessageSink};
use crate::pagination::{ContinuationToken, NextPage, NextUrlPaginator, PaginationState, Paginator};
use crate::partition::{ParentRouter, PartitionContext};
use crate::state::StateManager;
use crate::stream::{StartingTimestamp, Stream};
use crate::template;
use crate::types::JsonValue;
use std::time::Instant;
use tracing::{debug, info};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// State manager
    state: StateManager,
    /// Tap configuration
    config: TapConfig,
    /// Paginator shared by all streams
    paginator: NextUrlPaginator,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: HttpClient, state: StateManager, config: TapConfig) -> Self {
        Self {
            client,
            state,
            config,
            paginator: NextUrlPaginator::default(),
            stats: SyncStats::default(),
        }
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Starting timestamp of one stream partition
    async fn starting_timestamp(
        &self,
        stream: &dyn Stream,
        context: &PartitionContext,
    ) -> Result<Option<StartingTimestamp>> {
        if stream.replication_key().is_none() {
            return Ok(None);
        }
        let bookmark = self.state.get_bookmark(stream.name(), context).await;
        StartingTimestamp::resolve(bookmark.as_deref(), self.config.start_date)
    }

    /// Run the pagination loop of one stream partition
    ///
    /// Pages are fetched strictly one after another and each page's records
    /// are written to the sink before the next request (nothing is written
    /// when `emit` is false). The pagination state is local to this call, so
    /// an early stop ends this partition only.
    pub async fn sync_partition(
        &mut self,
        stream: &dyn Stream,
        context: &PartitionContext,
        sink: &mut dyn MessageSink,
        emit: bool,
    ) -> Result<PartitionOutcome> {
        let path = template::render(stream.path(), context)?;
        let starting = self.starting_timestamp(stream, context).await?;

        debug!(
            stream = stream.name(),
            partition = %context,
            starting = ?starting.as_ref().map(StartingTimestamp::isoformat),
            "Starting partition"
        );

        let mut outcome = PartitionOutcome::default();
        let mut pagination = PaginationState::new();
        let mut token: Option<ContinuationToken> = None;

        loop {
            let params = stream.url_params(&self.config, context, starting.as_ref(), token.as_ref());
            let body: JsonValue = self
                .client
                .get_json(&path, RequestConfig::new().with_query(params))
                .await?;
            outcome.pages += 1;
            self.stats.add_page();

            let records = stream.parse_page(&body)?;
            let fetched = records.len();

            for record in records {
                let Some(mut record) =
                    stream.post_process(record, starting.as_ref(), &mut pagination)?
                else {
                    continue;
                };

                if let Some(value) = stream
                    .replication_key()
                    .and_then(|key| record.get(key))
                    .and_then(JsonValue::as_str)
                {
                    outcome.observe_replication_value(value);
                }

                context.attach_to(&mut record);
                if let Some(child) = stream.child_context(&record)? {
                    outcome.child_contexts.push(child);
                }
                outcome.records += 1;
                if emit {
                    sink.emit(Message::record(stream.name(), record))?;
                }
            }

            debug!(
                stream = stream.name(),
                partition = %context,
                page = outcome.pages,
                fetched,
                "Fetched page"
            );

            match self.paginator.process_response(&body, fetched, &mut pagination)? {
                NextPage::Continue(next) => token = Some(next),
                NextPage::Done => break,
            }
        }

        if pagination.is_force_stopped() {
            outcome.stopped_early = true;
            self.stats.add_early_stop();
            debug!(
                stream = stream.name(),
                partition = %context,
                "Stopped at replication cutoff"
            );
        }

        if let (Some(key), Some(value)) = (stream.replication_key(), &outcome.max_replication_value) {
            self.state
                .advance_bookmark(stream.name(), context, key, value)
                .await;
        }

        self.stats.add_partition();
        self.stats.add_records(outcome.records);
        Ok(outcome)
    }

    /// Sync every partition of a stream
    ///
    /// When `emit` is false the stream only runs to produce contexts for its
    /// children; nothing is written to the sink. Returns the distinct child
    /// contexts derived from the stream's records.
    pub async fn sync_stream(
        &mut self,
        stream: &dyn Stream,
        partitions: &[PartitionContext],
        sink: &mut dyn MessageSink,
        emit: bool,
    ) -> Result<ParentRouter> {
        let start = Instant::now();
        info!(
            stream = stream.name(),
            partitions = partitions.len(),
            "Starting sync for stream"
        );

        if emit {
            sink.emit(Message::schema(
                stream.name(),
                stream.schema()?,
                stream.primary_keys(),
                stream.replication_key(),
            ))?;
        }

        let mut children = ParentRouter::new();
        let mut records = 0;

        for context in partitions {
            let outcome = self.sync_partition(stream, context, sink, emit).await?;
            records += outcome.records;
            children.extend(outcome.child_contexts);
        }

        if emit {
            sink.emit(Message::state(self.state.to_value().await?))?;
            sink.flush()?;
        }

        self.stats.add_stream();
        info!(
            stream = stream.name(),
            records,
            emitted = emit,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Completed sync for stream"
        );

        Ok(children)
    }
}

#[cfg(test)]
mod tests;
