//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs, using the
//! Singer bookmark layout:
//!
//! ```json
//! {"bookmarks": {"commits": {"partitions": [
//!     {"context": {"repository_id": "acme/widgets"},
//!      "replication_key": "date",
//!      "replication_key_value": "2024-03-01T00:00:00+00:00"}
//! ]}}}
//! ```

use crate::partition::PartitionContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state for the tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamBookmark>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get bookmarks for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamBookmark> {
        self.bookmarks.get(stream)
    }

    /// Get mutable bookmarks for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamBookmark {
        self.bookmarks.entry(stream.to_string()).or_default()
    }

    /// Bookmarked replication value for one stream partition
    pub fn get_bookmark(&self, stream: &str, context: &PartitionContext) -> Option<&str> {
        self.get_stream(stream)?
            .get_partition(context)?
            .replication_key_value
            .as_deref()
    }

    /// Advance the bookmark of one stream partition
    ///
    /// The stored value only moves forward (string order); returns whether
    /// it changed.
    pub fn advance_bookmark(
        &mut self,
        stream: &str,
        context: &PartitionContext,
        replication_key: &str,
        value: &str,
    ) -> bool {
        let bookmark = self.get_stream_mut(stream).get_partition_mut(context);
        if bookmark
            .replication_key_value
            .as_deref()
            .is_some_and(|current| current >= value)
        {
            return false;
        }
        bookmark.replication_key = Some(replication_key.to_string());
        bookmark.replication_key_value = Some(value.to_string());
        true
    }
}

/// Bookmarks for a single stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamBookmark {
    /// One entry per partition context that has been synced
    #[serde(default)]
    pub partitions: Vec<PartitionBookmark>,
}

impl StreamBookmark {
    /// Get the bookmark for a partition
    pub fn get_partition(&self, context: &PartitionContext) -> Option<&PartitionBookmark> {
        self.partitions.iter().find(|p| &p.context == context)
    }

    /// Get the mutable bookmark for a partition, creating if needed
    pub fn get_partition_mut(&mut self, context: &PartitionContext) -> &mut PartitionBookmark {
        match self.partitions.iter().position(|p| &p.context == context) {
            Some(idx) => &mut self.partitions[idx],
            None => {
                self.partitions.push(PartitionBookmark::new(context.clone()));
                let last = self.partitions.len() - 1;
                &mut self.partitions[last]
            }
        }
    }
}

/// Bookmark for a single partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionBookmark {
    /// Partition context the bookmark belongs to
    pub context: PartitionContext,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<String>,
}

impl PartitionBookmark {
    /// Create an empty bookmark for a partition
    pub fn new(context: PartitionContext) -> Self {
        Self {
            context,
            replication_key: None,
            replication_key_value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn repo(name: &str) -> PartitionContext {
        PartitionContext::new().with("repository_id", name)
    }

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.bookmarks.is_empty());
        assert_eq!(serde_json::to_value(&state).unwrap(), json!({"bookmarks": {}}));
    }

    #[test]
    fn test_bookmark_per_partition() {
        let mut state = State::new();
        assert!(state.get_bookmark("commits", &repo("acme/a")).is_none());

        state.advance_bookmark("commits", &repo("acme/a"), "date", "2024-01-01T00:00:00+00:00");
        state.advance_bookmark("commits", &repo("acme/b"), "date", "2024-02-01T00:00:00+00:00");

        assert_eq!(
            state.get_bookmark("commits", &repo("acme/a")),
            Some("2024-01-01T00:00:00+00:00")
        );
        assert_eq!(
            state.get_bookmark("commits", &repo("acme/b")),
            Some("2024-02-01T00:00:00+00:00")
        );
        assert_eq!(state.get_stream("commits").unwrap().partitions.len(), 2);
    }

    #[test]
    fn test_bookmark_only_moves_forward() {
        let mut state = State::new();
        let ctx = repo("acme/a");

        assert!(state.advance_bookmark("commits", &ctx, "date", "2024-02-01"));
        assert!(!state.advance_bookmark("commits", &ctx, "date", "2024-01-01"));
        assert!(!state.advance_bookmark("commits", &ctx, "date", "2024-02-01"));
        assert!(state.advance_bookmark("commits", &ctx, "date", "2024-03-01"));

        assert_eq!(state.get_bookmark("commits", &ctx), Some("2024-03-01"));
    }

    #[test]
    fn test_state_wire_format() {
        let mut state = State::new();
        state.advance_bookmark("commits", &repo("acme/widgets"), "date", "2024-03-01T00:00:00+00:00");

        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "bookmarks": {
                    "commits": {
                        "partitions": [{
                            "context": {"repository_id": "acme/widgets"},
                            "replication_key": "date",
                            "replication_key_value": "2024-03-01T00:00:00+00:00"
                        }]
                    }
                }
            })
        );
    }

    #[test]
    fn test_state_parses_sparse_input() {
        let state: State = serde_json::from_value(json!({
            "bookmarks": {"workspaces": {}, "commits": {"partitions": [{"context": {"repository_id": "a/b"}}]}}
        }))
        .unwrap();

        assert!(state.get_stream("workspaces").unwrap().partitions.is_empty());
        assert!(state.get_bookmark("commits", &repo("a/b")).is_none());
    }
}
