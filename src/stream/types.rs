//! Stream capability contract

use crate::config::TapConfig;
use crate::decode::{JsonDecoder, RecordDecoder};
use crate::error::{Error, Result};
use crate::pagination::{ContinuationToken, PaginationState};
use crate::partition::PartitionContext;
use crate::types::{JsonValue, Record, ReplicationMethod, StringMap};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use std::fmt;

// ============================================================================
// Replication
// ============================================================================

/// How a stream's replication key shapes its request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplicationFilter {
    /// Send `q=(<key> >= <ts>)` and `sort=~<key>`
    #[default]
    QueryAndSort,
    /// Never send replication parameters; the endpoint orders results itself
    Disabled,
}

/// Replication cutoff for one stream partition
///
/// A bookmark keeps its stored text, offset included, so the cutoff compares
/// equal to the record it was taken from. Only the configured start date is
/// rendered, in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartingTimestamp {
    at: DateTime<FixedOffset>,
    text: String,
}

impl StartingTimestamp {
    /// Cutoff from a UTC timestamp
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self {
            at: ts.fixed_offset(),
            text: ts.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        }
    }

    /// Parse a bookmark value, keeping its text verbatim
    pub fn parse(value: &str) -> Result<Self> {
        let at = DateTime::parse_from_rfc3339(value)
            .map_err(|e| Error::state(format!("Invalid bookmark timestamp '{value}': {e}")))?;
        Ok(Self {
            at,
            text: value.to_string(),
        })
    }

    /// Resolve the cutoff from a partition bookmark, falling back to the configured start date
    pub fn resolve(bookmark: Option<&str>, start_date: Option<DateTime<Utc>>) -> Result<Option<Self>> {
        match bookmark {
            Some(value) => Self::parse(value).map(Some),
            None => Ok(start_date.map(Self::new)),
        }
    }

    /// ISO-8601 text used in filters and cutoff comparisons
    ///
    /// A start date renders with a `+00:00` offset and fractional seconds
    /// only when non-zero.
    pub fn isoformat(&self) -> &str {
        &self.text
    }

    /// Underlying timestamp
    pub fn as_datetime(&self) -> DateTime<FixedOffset> {
        self.at
    }
}

impl fmt::Display for StartingTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ============================================================================
// Allow-list
// ============================================================================

/// Restricts a stream to records whose field matches one of the given values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    pub field: &'static str,
    pub values: Vec<String>,
}

impl AllowList {
    pub fn new(field: &'static str, values: Vec<String>) -> Self {
        Self { field, values }
    }

    /// Filter clause `(<field> = "a" OR <field> = "b")`, or `None` for an empty list
    pub fn clause(&self) -> Option<String> {
        if self.values.is_empty() {
            return None;
        }
        let terms: Vec<String> = self
            .values
            .iter()
            .map(|v| format!("{} = \"{v}\"", self.field))
            .collect();
        Some(format!("({})", terms.join(" OR ")))
    }

    /// Conjoin the clause with any `q` already in the parameters
    pub fn apply(&self, params: &mut StringMap) {
        let Some(clause) = self.clause() else {
            return;
        };
        let q = match params.get("q").filter(|q| !q.is_empty()) {
            Some(existing) => format!("{existing} AND {clause}"),
            None => clause,
        };
        params.insert("q".to_string(), q);
    }
}

// ============================================================================
// Stream Trait
// ============================================================================

/// A REST resource the tap can sync
///
/// Implementors declare the resource; the sync engine drives the requests.
/// Per-run pagination state is passed in explicitly and never stored on the
/// stream, so one stream value can serve any number of partitions.
pub trait Stream: Send + Sync + fmt::Debug {
    /// Stream name as it appears in the catalog
    fn name(&self) -> &'static str;

    /// Path template relative to the API base URL
    fn path(&self) -> &'static str;

    fn primary_keys(&self) -> &'static [&'static str];

    fn replication_key(&self) -> Option<&'static str> {
        None
    }

    fn replication_filter(&self) -> ReplicationFilter {
        ReplicationFilter::QueryAndSort
    }

    /// Whether the run stops at the first record at or before the cutoff
    fn early_stop(&self) -> bool {
        false
    }

    /// Name of the stream whose records provide this stream's partitions
    fn parent(&self) -> Option<&'static str> {
        None
    }

    /// JSON schema of the stream's records
    fn schema(&self) -> Result<JsonValue>;

    /// Partitions derived from configuration, for streams without a parent
    fn static_partitions(&self, _config: &TapConfig) -> Vec<PartitionContext> {
        vec![PartitionContext::new()]
    }

    /// Allow-list restricting the records of one partition
    fn allow_list(&self, _config: &TapConfig, _context: &PartitionContext) -> Option<AllowList> {
        None
    }

    /// Context handed to child streams for one record
    fn child_context(&self, _record: &Record) -> Result<Option<PartitionContext>> {
        Ok(None)
    }

    fn replication_method(&self) -> ReplicationMethod {
        if self.replication_key().is_some() {
            ReplicationMethod::Incremental
        } else {
            ReplicationMethod::FullTable
        }
    }

    /// Query parameters for one page request
    ///
    /// Continuation pairs go in first so the replication and allow-list
    /// parameters always take precedence over whatever the `next` URL carried.
    /// `q` is rebuilt on every page; the `next` URL echoes the previous one.
    fn url_params(
        &self,
        config: &TapConfig,
        context: &PartitionContext,
        starting: Option<&StartingTimestamp>,
        token: Option<&ContinuationToken>,
    ) -> StringMap {
        let mut params = StringMap::new();
        if let Some(token) = token {
            token.merge_into(&mut params);
            params.remove("q");
        }

        if let Some(key) = self.replication_key() {
            if self.replication_filter() == ReplicationFilter::QueryAndSort {
                if let Some(starting) = starting {
                    params.insert("q".to_string(), format!("({key} >= {})", starting.isoformat()));
                }
                params.insert("sort".to_string(), format!("~{key}"));
            }
        }

        if let Some(allow_list) = self.allow_list(config, context) {
            allow_list.apply(&mut params);
        }

        params
    }

    /// Extract the records of one response body, in order
    fn parse_page(&self, body: &JsonValue) -> Result<Vec<Record>> {
        JsonDecoder::default().decode(body)
    }

    /// Filter one record, updating the run's force-stop flag
    ///
    /// Returns `None` when the record must not be emitted.
    fn post_process(
        &self,
        record: Record,
        starting: Option<&StartingTimestamp>,
        state: &mut PaginationState,
    ) -> Result<Option<Record>> {
        if state.is_force_stopped() {
            return Ok(None);
        }
        if !self.early_stop() {
            return Ok(Some(record));
        }
        let (Some(key), Some(starting)) = (self.replication_key(), starting) else {
            return Ok(Some(record));
        };

        let value = record.get(key).and_then(JsonValue::as_str).ok_or_else(|| {
            Error::extraction(
                key,
                format!("record in stream '{}' has no string replication value", self.name()),
            )
        })?;

        // Results arrive newest first, so the first old record ends the run.
        if value <= starting.isoformat() {
            state.force_stop();
            return Ok(None);
        }
        Ok(Some(record))
    }
}
