//! The Bitbucket tap
//!
//! Owns the ordered stream list and wires parent records into child
//! partitions. Streams run breadth-first: every partition of a parent stream
//! completes before its children start.

use crate::config::TapConfig;
use crate::connector::{Catalog, CatalogStream, CheckResult, Connector, ConnectorSpec};
use crate::engine::{SyncEngine, SyncStats};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::output::MessageSink;
use crate::partition::{PartitionContext, PartitionRouter};
use crate::state::StateManager;
use crate::stream::{CommitsStream, DeploymentsStream, RepositoriesStream, Stream, WorkspacesStream};
use crate::template;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{info, warn};

/// Every stream the tap knows, parents before children
pub fn all_streams() -> Vec<Box<dyn Stream>> {
    vec![
        Box::new(WorkspacesStream),
        Box::new(RepositoriesStream),
        Box::new(CommitsStream),
        Box::new(DeploymentsStream),
    ]
}

/// Streams synced by default
// Deployments is defined but kept out of the enabled set.
pub fn enabled_streams() -> Vec<Box<dyn Stream>> {
    vec![
        Box::new(WorkspacesStream),
        Box::new(RepositoriesStream),
        Box::new(CommitsStream),
    ]
}

/// HTTP client settings for a configuration
pub fn http_config(config: &TapConfig) -> HttpClientConfig {
    HttpClientConfig::builder()
        .base_url(config.api_url.clone())
        .header("Content-Type", "application/json")
        .build()
}

/// Bitbucket Cloud tap
pub struct Tap {
    config: TapConfig,
    streams: Vec<Box<dyn Stream>>,
    http: HttpClientConfig,
}

impl Tap {
    /// Create a tap with the enabled streams
    pub fn new(config: TapConfig) -> Self {
        Self::with_streams(config, enabled_streams())
    }

    /// Create a tap with an explicit stream list, parents before children
    pub fn with_streams(config: TapConfig, streams: Vec<Box<dyn Stream>>) -> Self {
        let http = http_config(&config);
        Self {
            config,
            streams,
            http,
        }
    }

    /// Override the HTTP client settings
    #[must_use]
    pub fn with_http_config(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }

    /// Tap configuration
    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Look up a stream by name
    pub fn stream(&self, name: &str) -> Option<&dyn Stream> {
        self.streams
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    /// Stream names in sync order
    pub fn stream_names(&self) -> Vec<&'static str> {
        self.streams.iter().map(|s| s.name()).collect()
    }

    fn client(&self) -> Result<HttpClient> {
        HttpClient::with_auth(self.http.clone(), self.config.auth())
    }

    /// Streams to run, in order, each flagged with whether its records are emitted
    ///
    /// Parents of selected streams run silently so their children get contexts.
    pub fn plan(&self, selection: Option<&[String]>) -> Result<Vec<(&dyn Stream, bool)>> {
        let Some(selection) = selection else {
            return Ok(self.streams.iter().map(|s| (s.as_ref(), true)).collect());
        };

        let mut selected = HashSet::new();
        for name in selection {
            let stream = self.stream(name).ok_or_else(|| Error::StreamNotFound {
                stream: name.clone(),
            })?;
            selected.insert(stream.name());
        }

        let mut required = selected.clone();
        for name in &selected {
            let mut parent = self.stream(name).and_then(|s| s.parent());
            while let Some(p) = parent {
                let stream = self.stream(p).ok_or_else(|| Error::StreamNotFound {
                    stream: p.to_string(),
                })?;
                required.insert(stream.name());
                parent = stream.parent();
            }
        }

        Ok(self
            .streams
            .iter()
            .filter(|s| required.contains(s.name()))
            .map(|s| (s.as_ref(), selected.contains(s.name())))
            .collect())
    }
}

#[async_trait]
impl Connector for Tap {
    fn spec(&self) -> ConnectorSpec {
        ConnectorSpec::tap_bitbucket()
    }

    async fn check(&self) -> Result<CheckResult> {
        let Some(stream) = self.streams.first() else {
            return Ok(CheckResult::failure("No streams configured"));
        };
        let context = stream
            .static_partitions(&self.config)
            .into_iter()
            .next()
            .unwrap_or_default();
        let path = template::render(stream.path(), &context)?;
        let params = stream.url_params(&self.config, &context, None, None);

        info!(stream = stream.name(), path = %path, "Checking connection");
        let client = self.client()?;
        match client
            .get_with_config(&path, RequestConfig::new().with_query(params))
            .await
        {
            Ok(_) => Ok(CheckResult::success()),
            Err(e) => {
                warn!(error = %e, "Connection check failed");
                Ok(CheckResult::failure(format!("Connection failed: {e}")))
            }
        }
    }

    async fn discover(&self) -> Result<Catalog> {
        let streams = self
            .streams
            .iter()
            .map(|s| {
                Ok(CatalogStream {
                    tap_stream_id: s.name().to_string(),
                    stream: s.name().to_string(),
                    schema: s.schema()?,
                    key_properties: s.primary_keys().iter().map(ToString::to_string).collect(),
                    replication_key: s.replication_key().map(ToString::to_string),
                    replication_method: s.replication_method(),
                    parent_stream: s.parent().map(ToString::to_string),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Catalog { streams })
    }

    async fn read(
        &self,
        selection: Option<&[String]>,
        state: StateManager,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        let plan = self.plan(selection)?;
        let mut engine = SyncEngine::new(self.client()?, state, self.config.clone());

        // Child contexts produced by each stream, keyed by the producing stream
        let mut contexts: HashMap<&str, Vec<PartitionContext>> = HashMap::new();

        for (stream, emit) in plan {
            let partitions = match stream.parent() {
                None => stream.static_partitions(&self.config),
                Some(parent) => contexts.get(parent).cloned().unwrap_or_default(),
            };

            let children = engine.sync_stream(stream, &partitions, sink, emit).await?;
            contexts.insert(stream.name(), children.partitions()?);
        }

        let mut stats = engine.stats().clone();
        stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            streams = stats.streams_synced,
            partitions = stats.partitions_synced,
            records = stats.records_synced,
            pages = stats.pages_fetched,
            early_stops = stats.early_stops,
            duration_ms = stats.duration_ms,
            "Sync completed"
        );
        Ok(stats)
    }
}
