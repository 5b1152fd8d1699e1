//! Pagination strategy implementations

use super::types::{ContinuationToken, NextPage, PaginationState, Paginator};
use crate::error::Result;
use serde_json::Value;
use tracing::debug;

/// Next URL pagination (URL in response body)
///
/// Extracts the next page URL from a top-level field of the response body,
/// e.g. `{ "values": [...], "next": "https://api.bitbucket.org/2.0/x?page=2" }`.
#[derive(Debug, Clone)]
pub struct NextUrlPaginator {
    /// Field holding the next URL
    pub field: String,
}

impl Default for NextUrlPaginator {
    fn default() -> Self {
        Self {
            field: "next".to_string(),
        }
    }
}

impl NextUrlPaginator {
    fn next_url<'a>(&self, body: &'a Value) -> Option<&'a str> {
        body.get(&self.field)
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
    }
}

impl Paginator for NextUrlPaginator {
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> Result<NextPage> {
        state.add_fetched(records_count as u64);

        // Early stop wins over whatever the API advertises
        if state.is_force_stopped() {
            debug!(page = state.page, "Early stop requested, not following next link");
            state.mark_done();
            return Ok(NextPage::Done);
        }

        match self.next_url(body) {
            Some(url) => {
                let token = ContinuationToken::from_url(url)?;
                state.next_page();
                Ok(NextPage::Continue(token))
            }
            None => {
                state.mark_done();
                Ok(NextPage::Done)
            }
        }
    }
}
