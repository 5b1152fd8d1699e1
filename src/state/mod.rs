//! State management module
//!
//! Handles bookmark tracking between sync runs to enable incremental syncs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Singer bookmark document with per-partition replication values
//! - `StateManager` - Shared, file-backed access to the current state

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{PartitionBookmark, State, StreamBookmark};
