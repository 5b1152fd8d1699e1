//! Connector trait and catalog types
//!
//! Defines the operations a tap exposes to the command line: spec, check,
//! discover and read.

use crate::config::TapConfig;
use crate::engine::SyncStats;
use crate::error::Result;
use crate::output::MessageSink;
use crate::state::StateManager;
use crate::types::{JsonValue, ReplicationMethod};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Connector Spec
// ============================================================================

/// Connector specification returned by spec()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSpec {
    /// Connector name
    pub name: String,

    /// Connector version
    pub version: String,

    /// JSON schema of the configuration
    pub config_schema: JsonValue,
}

impl ConnectorSpec {
    /// Specification of this tap
    pub fn tap_bitbucket() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config_schema: TapConfig::json_schema(),
        }
    }
}

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Catalog of available streams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams, in sync order
    pub streams: Vec<CatalogStream>,
}

impl Catalog {
    /// Find a stream by name
    pub fn get(&self, name: &str) -> Option<&CatalogStream> {
        self.streams.iter().find(|s| s.stream == name)
    }
}

/// Stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStream {
    pub tap_stream_id: String,

    /// Stream name
    pub stream: String,

    /// JSON schema for the stream
    pub schema: JsonValue,

    /// Primary key fields
    pub key_properties: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    pub replication_method: ReplicationMethod,

    /// Stream whose records partition this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_stream: Option<String>,
}

// ============================================================================
// Connector Trait
// ============================================================================

/// Core trait of a tap
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the connector specification
    fn spec(&self) -> ConnectorSpec;

    /// Tests if credentials and configuration are valid
    async fn check(&self) -> Result<CheckResult>;

    /// Lists available streams
    async fn discover(&self) -> Result<Catalog>;

    /// Syncs the selected streams (all when `selection` is `None`), writing
    /// messages to the sink
    async fn read(
        &self,
        selection: Option<&[String]>,
        state: StateManager,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncStats>;
}
