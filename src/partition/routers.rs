//! Partition router implementations

use super::types::{PartitionContext, PartitionRouter};
use crate::error::Result;
use std::collections::HashSet;

// ============================================================================
// List Router
// ============================================================================

/// List-based partition router
///
/// Creates one partition per configured value.
#[derive(Debug, Clone)]
pub struct ListRouter {
    values: Vec<String>,
    partition_field: String,
}

impl ListRouter {
    /// Create a new list router
    pub fn new(values: Vec<String>, partition_field: impl Into<String>) -> Self {
        Self {
            values,
            partition_field: partition_field.into(),
        }
    }
}

impl PartitionRouter for ListRouter {
    fn partitions(&self) -> Result<Vec<PartitionContext>> {
        let mut seen = HashSet::new();
        Ok(self
            .values
            .iter()
            .filter(|v| seen.insert(v.as_str()))
            .map(|v| PartitionContext::new().with(self.partition_field.clone(), v.clone()))
            .collect())
    }
}

// ============================================================================
// Parent Router
// ============================================================================

/// Parent stream-based partition router
///
/// Collects the child contexts derived from a parent stream's records.
/// Duplicate contexts are dropped so a child never runs twice for the same
/// parent within one sync.
#[derive(Debug, Clone, Default)]
pub struct ParentRouter {
    contexts: Vec<PartitionContext>,
    seen: HashSet<PartitionContext>,
}

impl ParentRouter {
    /// Create an empty parent router
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a child context; returns false if it was already present
    pub fn push(&mut self, context: PartitionContext) -> bool {
        if self.seen.insert(context.clone()) {
            self.contexts.push(context);
            true
        } else {
            false
        }
    }

    /// Record many child contexts
    pub fn extend(&mut self, contexts: impl IntoIterator<Item = PartitionContext>) {
        for context in contexts {
            self.push(context);
        }
    }

    /// Number of distinct contexts collected
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether no contexts were collected
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl PartitionRouter for ParentRouter {
    fn partitions(&self) -> Result<Vec<PartitionContext>> {
        Ok(self.contexts.clone())
    }
}
