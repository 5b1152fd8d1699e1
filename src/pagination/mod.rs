//! Pagination module
//!
//! Bitbucket uses hyperlink pagination: every page carries the absolute URL
//! of the next one in its `next` field. A paginator turns a page body into
//! either a continuation token (the parsed query string of that URL) or a
//! signal that pagination is finished.
//!
//! Early stop always wins: once the per-run [`PaginationState`] has its
//! force-stop flag set, no further page is requested even if the API still
//! advertises one.

mod strategies;
mod types;

pub use strategies::NextUrlPaginator;
pub use types::{ContinuationToken, NextPage, PaginationState, Paginator};
