//! Decoder implementations

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use crate::types::Record;
use jsonpath_rust::JsonPath;
use serde_json::Value;

/// JSON decoder extracting records with a JSONPath expression
///
/// The container named by the first path segment must be present in the
/// body: a page without it is malformed, not empty.
#[derive(Debug, Clone)]
pub struct JsonDecoder {
    records_path: String,
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::with_path("$.values[*]")
    }
}

impl JsonDecoder {
    /// Create a JSON decoder with a records path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            records_path: path.into(),
        }
    }

    /// The configured records path
    pub fn records_path(&self) -> &str {
        &self.records_path
    }

    /// Top-level field that must exist in every page
    fn container(&self) -> &str {
        let path = self.records_path.strip_prefix("$.").unwrap_or(&self.records_path);
        let end = path.find(['.', '[']).unwrap_or(path.len());
        &path[..end]
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &Value) -> Result<Vec<Record>> {
        let object = body
            .as_object()
            .ok_or_else(|| Error::decode("Expected a JSON object as response body"))?;

        let container = self.container();
        if !object.get(container).is_some_and(Value::is_array) {
            return Err(Error::extraction(
                &self.records_path,
                format!("response has no '{container}' array"),
            ));
        }

        let jp = JsonPath::try_from(self.records_path.as_str()).map_err(|e| Error::JsonPath {
            message: format!("Invalid JSONPath: {e}"),
        })?;

        let found = match jp.find(body) {
            Value::Array(arr) => arr,
            Value::Null => Vec::new(),
            other => vec![other],
        };

        found
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(record) => Ok(record),
                other => Err(Error::extraction(
                    &self.records_path,
                    format!("element {index} is not an object: {other}"),
                )),
            })
            .collect()
    }
}
