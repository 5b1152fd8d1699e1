//! Decoder types and traits

use crate::error::Result;
use crate::types::Record;
use serde_json::Value;

/// Trait for extracting records from a decoded page body
pub trait RecordDecoder: Send + Sync {
    /// Extract the records of one page, preserving API order
    fn decode(&self, body: &Value) -> Result<Vec<Record>>;
}
