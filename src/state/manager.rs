//! State manager implementation
//!
//! Provides file-based state persistence with atomic writes.

use super::types::State;
use crate::error::{Error, Result};
use crate::partition::PartitionContext;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// State manager for loading, updating and persisting bookmarks
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct StateManager {
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Create an in-memory state manager with empty state
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Create a state manager holding the given state
    pub fn with_state(state: State) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Create a state manager from a file, starting empty if the file does not exist
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::in_memory());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        Self::from_json(&contents)
    }

    /// Create a state manager from inline JSON string
    ///
    /// An empty document is treated as empty state.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::in_memory());
        }

        let state: State = serde_json::from_str(json)
            .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))?;
        Ok(Self::with_state(state))
    }

    /// Save state to a file path
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_json_pretty().await?;

        // Write to temp file first, then rename for atomicity
        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }

    /// Snapshot of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Current state as a JSON value
    pub async fn to_value(&self) -> Result<serde_json::Value> {
        let state = self.state.read().await;
        Ok(serde_json::to_value(&*state)?)
    }

    /// Export state as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Get the bookmark of a stream partition
    pub async fn get_bookmark(&self, stream: &str, context: &PartitionContext) -> Option<String> {
        let state = self.state.read().await;
        state.get_bookmark(stream, context).map(ToString::to_string)
    }

    /// Advance the bookmark of a stream partition; returns whether it changed
    pub async fn advance_bookmark(
        &self,
        stream: &str,
        context: &PartitionContext,
        replication_key: &str,
        value: &str,
    ) -> bool {
        let mut state = self.state.write().await;
        state.advance_bookmark(stream, context, replication_key, value)
    }
}
