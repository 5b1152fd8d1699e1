// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-bitbucket
//!
//! A Singer tap extracting workspaces, repositories and commits from the
//! Bitbucket Cloud REST API.
//!
//! ## Features
//!
//! - **Parent/child streams**: workspaces → repositories → commits, each child
//!   partitioned by its parent's records
//! - **Next-link pagination**: follows the `next` URL of every page
//! - **Incremental commits**: bookmarks per repository, with early stop at the
//!   first already-synced commit
//! - **Allow-lists**: restrict workspaces and repositories through the `q` filter
//! - **Retry with backoff**: exponential backoff with full jitter, honouring `Retry-After`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_bitbucket::{Connector, StateManager, Tap, TapConfig};
//!
//! #[tokio::main]
//! async fn main() -> tap_bitbucket::Result<()> {
//!     let config = TapConfig::from_json(&std::fs::read_to_string("config.json")?)?;
//!     let tap = Tap::new(config);
//!
//!     // Check connection
//!     let status = tap.check().await?;
//!
//!     // Read everything, collecting messages in memory
//!     let mut messages = Vec::new();
//!     let stats = tap.read(None, StateManager::in_memory(), &mut messages).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Connector Interface                         │
//! │  spec() → ConfigSpec    check() → Status    discover() → Catalog│
//! │  read(selection, state, sink) → SCHEMA / RECORD / STATE         │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Stream  │   HTTP    │   Paginate    │ Partition │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Params   │ Basic auth│ Next URL      │ Parent    │ JSON lines  │
//! │ Cutoff   │ Retry     │ Early stop    │ List      │ State       │
//! │ Schema   │ Rate Limit│               │           │             │
//! │          │ Backoff   │               │           │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Basic authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Next-link pagination
pub mod pagination;

/// Partition routing
pub mod partition;

/// Response decoders
pub mod decode;

/// Bookmark state management
pub mod state;

/// Singer message output
pub mod output;

/// Main execution engine
pub mod engine;

/// Tap configuration
pub mod config;

/// Connector trait and catalog
pub mod connector;

/// Stream definitions
pub mod stream;

/// The tap and its stream wiring
pub mod tap;

/// Path template interpolation
pub mod template;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::TapConfig;
pub use connector::Connector;
pub use state::StateManager;
pub use tap::Tap;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
