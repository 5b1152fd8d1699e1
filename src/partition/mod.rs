//! Partition routing module
//!
//! Supports: static list (from configuration) and parent stream records
//!
//! # Overview
//!
//! A partition context scopes one pagination run of a stream. It fills the
//! placeholders of the stream's path, keys the stream's bookmark, and is
//! attached to every record emitted during that run.
//! - Top-level streams get one context per configured value
//! - Child streams get one context per distinct record of their parent

mod routers;
mod types;

pub use routers::{ListRouter, ParentRouter};
pub use types::{PartitionContext, PartitionRouter};
