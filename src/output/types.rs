//! Singer message types

use crate::types::{JsonValue, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message written to the output stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Schema of a stream, written before its first record
    Schema {
        stream: String,
        schema: JsonValue,
        key_properties: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One extracted record
    Record {
        stream: String,
        record: Record,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_extracted: Option<DateTime<Utc>>,
    },
    /// Full state document to persist
    State { value: JsonValue },
}

impl Message {
    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: JsonValue,
        key_properties: &[&str],
        replication_key: Option<&str>,
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties: key_properties.iter().map(ToString::to_string).collect(),
            bookmark_properties: replication_key.into_iter().map(ToString::to_string).collect(),
        }
    }

    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, record: Record) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Some(Utc::now()),
        }
    }

    /// Create a state message
    pub fn state(value: JsonValue) -> Self {
        Self::State { value }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Stream the message belongs to, if any
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }
}
