//! Record schemas embedded in the binary

use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Schema documents keyed by stream name
static SCHEMAS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("workspaces", include_str!("../../schemas/workspaces.json"));
    m.insert("repositories", include_str!("../../schemas/repositories.json"));
    m.insert("commits", include_str!("../../schemas/commits.json"));
    m.insert("deployments", include_str!("../../schemas/deployments.json"));
    m
});

/// Parsed schema for a stream
pub fn load(stream: &str) -> Result<JsonValue> {
    let raw = SCHEMAS.get(stream).ok_or_else(|| Error::StreamNotFound {
        stream: stream.to_string(),
    })?;
    serde_json::from_str(raw)
        .map_err(|e| Error::config(format!("Invalid schema for stream '{stream}': {e}")))
}
