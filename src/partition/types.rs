//! Partition types and traits

use crate::error::Result;
use crate::types::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Key-value pairs scoping one stream-partition run
///
/// Ordered so that equal contexts serialize identically and compare equal
/// regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionContext(BTreeMap<String, String>);

impl PartitionContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the context has no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over key-value pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy the context values into a record, keeping fields the record already has
    pub fn attach_to(&self, record: &mut Record) {
        for (key, value) in &self.0 {
            record
                .entry(key.clone())
                .or_insert_with(|| Value::String(value.clone()));
        }
    }
}

impl fmt::Display for PartitionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Trait for partition routers
pub trait PartitionRouter: Send + Sync {
    /// Generate partition contexts, in run order
    fn partitions(&self) -> Result<Vec<PartitionContext>>;
}
