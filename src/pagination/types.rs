//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by the paginator.

use crate::error::Result;
use crate::types::StringMap;
use serde_json::Value;
use url::Url;

/// Query parameters carried from one page to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuationToken {
    params: Vec<(String, String)>,
}

impl ContinuationToken {
    /// Build a token from the query string of a "next" URL
    pub fn from_url(next_url: &str) -> Result<Self> {
        let url = Url::parse(next_url)?;
        let params = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Self { params })
    }

    /// Get a parameter value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Merge all pairs into a parameter map; later pairs win on duplicate keys
    pub fn merge_into(&self, params: &mut StringMap) {
        for (key, value) in &self.params {
            params.insert(key.clone(), value.clone());
        }
    }

    /// Whether the token carries no parameters
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Another page should be fetched with this token
    Continue(ContinuationToken),
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Per-run pagination state
///
/// One value is created for every stream-partition run and dropped when the
/// run ends, so the force-stop flag can never carry over to another
/// partition.
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages processed so far
    pub page: u32,
    /// Records received from the API so far
    pub total_fetched: u64,
    /// Set once a record at or before the cutoff has been seen
    pub force_stop: bool,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request early termination of this run
    pub fn force_stop(&mut self) {
        self.force_stop = true;
    }

    /// Whether early termination has been requested
    pub fn is_force_stopped(&self) -> bool {
        self.force_stop
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Increment page number
    pub fn next_page(&mut self) {
        self.page += 1;
    }

    /// Add to total fetched
    pub fn add_fetched(&mut self, count: u64) {
        self.total_fetched += count;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Process a page body and decide whether another page should be fetched
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> Result<NextPage>;
}
