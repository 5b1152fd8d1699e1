//! Bitbucket resource streams

use super::schemas;
use super::types::{AllowList, ReplicationFilter, Stream};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::partition::{ListRouter, PartitionContext, PartitionRouter};
use crate::types::{JsonValue, Record};

fn string_field<'a>(record: &'a Record, field: &str, stream: &str) -> Result<&'a str> {
    record.get(field).and_then(JsonValue::as_str).ok_or_else(|| {
        Error::extraction(field, format!("record in stream '{stream}' has no string '{field}'"))
    })
}

// ============================================================================
// Workspaces
// ============================================================================

/// `/workspaces`, one partition per configured workspace
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkspacesStream;

impl Stream for WorkspacesStream {
    fn name(&self) -> &'static str {
        "workspaces"
    }

    fn path(&self) -> &'static str {
        "/workspaces"
    }

    fn primary_keys(&self) -> &'static [&'static str] {
        &["slug", "uuid"]
    }

    fn schema(&self) -> Result<JsonValue> {
        schemas::load(self.name())
    }

    fn static_partitions(&self, config: &TapConfig) -> Vec<PartitionContext> {
        ListRouter::new(config.workspaces.clone(), "workspace")
            .partitions()
            .unwrap_or_default()
    }

    // Scoped to the partition's own workspace. Every partition sending the OR
    // of all configured workspaces would return, and emit, each workspace once
    // per partition.
    fn allow_list(&self, config: &TapConfig, context: &PartitionContext) -> Option<AllowList> {
        let values = match context.get("workspace") {
            Some(workspace) => vec![workspace.to_string()],
            None => config.workspaces.clone(),
        };
        Some(AllowList::new("slug", values))
    }

    fn child_context(&self, record: &Record) -> Result<Option<PartitionContext>> {
        let slug = string_field(record, "slug", self.name())?;
        Ok(Some(PartitionContext::new().with("workspace_id", slug)))
    }
}

// ============================================================================
// Repositories
// ============================================================================

/// `/repositories/{workspace_id}`, child of workspaces
#[derive(Debug, Clone, Copy, Default)]
pub struct RepositoriesStream;

impl Stream for RepositoriesStream {
    fn name(&self) -> &'static str {
        "repositories"
    }

    fn path(&self) -> &'static str {
        "/repositories/{workspace_id}"
    }

    fn primary_keys(&self) -> &'static [&'static str] {
        &["uuid"]
    }

    fn parent(&self) -> Option<&'static str> {
        Some("workspaces")
    }

    fn schema(&self) -> Result<JsonValue> {
        schemas::load(self.name())
    }

    fn allow_list(&self, config: &TapConfig, _context: &PartitionContext) -> Option<AllowList> {
        Some(AllowList::new("full_name", config.repositories.clone()))
    }

    fn child_context(&self, record: &Record) -> Result<Option<PartitionContext>> {
        let full_name = string_field(record, "full_name", self.name())?;
        Ok(Some(PartitionContext::new().with("repository_id", full_name)))
    }
}

// ============================================================================
// Commits
// ============================================================================

/// `/repositories/{repository_id}/commits`, incremental on `date`
///
/// The commits endpoint ignores `q` and `sort` and always returns newest
/// first, so the run ends early at the first already-synced commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitsStream;

impl Stream for CommitsStream {
    fn name(&self) -> &'static str {
        "commits"
    }

    fn path(&self) -> &'static str {
        "/repositories/{repository_id}/commits"
    }

    fn primary_keys(&self) -> &'static [&'static str] {
        &["hash"]
    }

    fn replication_key(&self) -> Option<&'static str> {
        Some("date")
    }

    fn replication_filter(&self) -> ReplicationFilter {
        ReplicationFilter::Disabled
    }

    fn early_stop(&self) -> bool {
        true
    }

    fn parent(&self) -> Option<&'static str> {
        Some("repositories")
    }

    fn schema(&self) -> Result<JsonValue> {
        schemas::load(self.name())
    }
}

// ============================================================================
// Deployments
// ============================================================================

/// `/repositories/{repository_id}/deployments`, child of repositories
#[derive(Debug, Clone, Copy, Default)]
pub struct DeploymentsStream;

impl Stream for DeploymentsStream {
    fn name(&self) -> &'static str {
        "deployments"
    }

    fn path(&self) -> &'static str {
        "/repositories/{repository_id}/deployments"
    }

    fn primary_keys(&self) -> &'static [&'static str] {
        &["uuid"]
    }

    fn parent(&self) -> Option<&'static str> {
        Some("repositories")
    }

    fn schema(&self) -> Result<JsonValue> {
        schemas::load(self.name())
    }
}
