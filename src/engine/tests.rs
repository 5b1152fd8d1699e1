//! Tests for engine module

use super::*;
use crate::http::HttpClientConfig;
use crate::output::Message;
use crate::partition::PartitionRouter;
use crate::stream::{CommitsStream, RepositoriesStream, WorkspacesStream};
use crate::types::Record;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tap_config(server: &MockServer, start_date: Option<&str>) -> TapConfig {
    let mut value = json!({
        "auth_username": "alice",
        "auth_password": "secret",
        "workspaces": ["acme"],
        "api_url": server.uri(),
    });
    if let Some(start_date) = start_date {
        value["start_date"] = json!(start_date);
    }
    TapConfig::from_value(&value).unwrap()
}

fn engine(server: &MockServer, start_date: Option<&str>, state: StateManager) -> SyncEngine {
    let http = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(0)
        .no_jitter()
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(http).unwrap();
    SyncEngine::new(client, state, tap_config(server, start_date))
}

fn repo(name: &str) -> PartitionContext {
    PartitionContext::new().with("repository_id", name)
}

fn commit(hash: &str, date: &str) -> Value {
    json!({"hash": hash, "date": date})
}

fn records(sink: &[Message]) -> Vec<&Record> {
    sink.iter()
        .filter_map(|m| match m {
            Message::Record { record, .. } => Some(record),
            _ => None,
        })
        .collect()
}

// ============================================================================
// SyncStats Tests
// ============================================================================

#[test]
fn test_sync_stats_counters() {
    let mut stats = SyncStats::new();
    stats.add_records(10);
    stats.add_page();
    stats.add_page();
    stats.add_partition();
    stats.add_stream();
    stats.add_early_stop();
    stats.set_duration(5);

    assert_eq!(stats.records_synced, 10);
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.partitions_synced, 1);
    assert_eq!(stats.streams_synced, 1);
    assert_eq!(stats.early_stops, 1);
    assert_eq!(stats.duration_ms, 5);
}

#[test]
fn test_outcome_tracks_string_max() {
    let mut outcome = PartitionOutcome::default();
    outcome.observe_replication_value("2024-01-02");
    outcome.observe_replication_value("2024-01-10");
    outcome.observe_replication_value("2024-01-05");

    assert_eq!(outcome.max_replication_value.as_deref(), Some("2024-01-10"));
}

// ============================================================================
// Partition Sync Tests
// ============================================================================

#[tokio::test]
async fn test_early_stop_skips_next_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme/widgets/commits"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                commit("c3", "2024-03-01T00:00:00+00:00"),
                commit("c2", "2023-12-31T00:00:00+00:00"),
                commit("c1", "2024-05-01T00:00:00+00:00"),
            ],
            "next": format!("{}/repositories/acme/widgets/commits?page=2", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme/widgets/commits"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .expect(0)
        .mount(&server)
        .await;

    let state = StateManager::in_memory();
    let mut engine = engine(&server, Some("2024-01-01T00:00:00Z"), state.clone());

    let mut sink: Vec<Message> = Vec::new();
    let outcome = engine
        .sync_partition(&CommitsStream, &repo("acme/widgets"), &mut sink, true)
        .await
        .unwrap();

    assert!(outcome.stopped_early);
    assert_eq!(outcome.pages, 1);
    assert_eq!(outcome.records, 1);
    let emitted = records(&sink);
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0]["hash"], json!("c3"));
    assert_eq!(emitted[0]["repository_id"], json!("acme/widgets"));
    assert_eq!(
        state.get_bookmark("commits", &repo("acme/widgets")).await,
        Some("2024-03-01T00:00:00+00:00".to_string())
    );
    assert_eq!(engine.stats().early_stops, 1);
}

#[tokio::test]
async fn test_force_stop_does_not_leak_across_partitions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme/old/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [commit("o1", "2023-06-01T00:00:00+00:00")],
            "next": format!("{}/repositories/acme/old/commits?page=2", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme/new/commits"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [commit("n2", "2024-04-01T00:00:00+00:00")],
            "next": format!("{}/repositories/acme/new/commits?page=2", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme/new/commits"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [commit("n1", "2024-02-01T00:00:00+00:00")],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = engine(&server, Some("2024-01-01T00:00:00Z"), StateManager::in_memory());

    let mut old_sink: Vec<Message> = Vec::new();
    let mut new_sink: Vec<Message> = Vec::new();
    let old = engine
        .sync_partition(&CommitsStream, &repo("acme/old"), &mut old_sink, true)
        .await
        .unwrap();
    let new = engine
        .sync_partition(&CommitsStream, &repo("acme/new"), &mut new_sink, true)
        .await
        .unwrap();

    assert!(old.stopped_early);
    assert_eq!(old.records, 0);
    assert!(old_sink.is_empty());
    assert!(old.max_replication_value.is_none());

    assert!(!new.stopped_early);
    assert_eq!(new.pages, 2);
    assert_eq!(new.records, 2);
    let hashes: Vec<_> = records(&new_sink).iter().map(|r| r["hash"].clone()).collect();
    assert_eq!(hashes, vec![json!("n2"), json!("n1")]);
}

#[tokio::test]
async fn test_bookmark_overrides_start_date() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme/widgets/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                commit("c3", "2024-03-01T00:00:00+00:00"),
                commit("c2", "2024-01-15T00:00:00+00:00"),
            ],
        })))
        .mount(&server)
        .await;

    let state = StateManager::from_json(
        r#"{"bookmarks":{"commits":{"partitions":[{"context":{"repository_id":"acme/widgets"},"replication_key":"date","replication_key_value":"2024-02-01T00:00:00+00:00"}]}}}"#,
    )
    .unwrap();
    let mut engine = engine(&server, Some("2023-01-01T00:00:00Z"), state.clone());

    let mut sink: Vec<Message> = Vec::new();
    let outcome = engine
        .sync_partition(&CommitsStream, &repo("acme/widgets"), &mut sink, true)
        .await
        .unwrap();

    assert_eq!(outcome.records, 1);
    assert!(outcome.stopped_early);
    assert_eq!(
        state.get_bookmark("commits", &repo("acme/widgets")).await,
        Some("2024-03-01T00:00:00+00:00".to_string())
    );
}

#[tokio::test]
async fn test_without_cutoff_all_pages_are_read() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme/widgets/commits"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [commit("c2", "2001-01-01T00:00:00+00:00")],
            "next": format!("{}/repositories/acme/widgets/commits?page=2", server.uri()),
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme/widgets/commits"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [commit("c1", "2000-01-01T00:00:00+00:00")],
        })))
        .mount(&server)
        .await;

    let mut engine = engine(&server, None, StateManager::in_memory());
    let mut sink: Vec<Message> = Vec::new();
    let outcome = engine
        .sync_partition(&CommitsStream, &repo("acme/widgets"), &mut sink, true)
        .await
        .unwrap();

    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.records, 2);
    assert_eq!(records(&sink).len(), 2);
    assert!(!outcome.stopped_early);
}

#[tokio::test]
async fn test_continuation_params_and_child_contexts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/workspaces"))
        .and(query_param("q", r#"(slug = "acme")"#))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"slug": "acme", "uuid": "{a}"}],
            "next": format!("{}/workspaces?page=2&pagelen=10", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/workspaces"))
        .and(query_param("page", "2"))
        .and(query_param("pagelen", "10"))
        .and(query_param("q", r#"(slug = "acme")"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"slug": "acme", "uuid": "{a}"}],
            "next": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = engine(&server, None, StateManager::in_memory());
    let mut sink: Vec<Message> = Vec::new();
    let outcome = engine
        .sync_partition(&WorkspacesStream, &PartitionContext::new().with("workspace", "acme"), &mut sink, true)
        .await
        .unwrap();

    assert_eq!(outcome.pages, 2);
    assert_eq!(records(&sink)[0]["workspace"], json!("acme"));
    assert_eq!(
        outcome.child_contexts,
        vec![
            PartitionContext::new().with("workspace_id", "acme"),
            PartitionContext::new().with("workspace_id", "acme"),
        ]
    );
}

#[tokio::test]
async fn test_records_written_before_next_page_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme/widgets/commits"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [commit("c2", "2024-02-01T00:00:00+00:00")],
            "next": format!("{}/repositories/acme/widgets/commits?page=2", server.uri()),
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme/widgets/commits"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let state = StateManager::in_memory();
    let mut engine = engine(&server, None, state.clone());
    let mut sink: Vec<Message> = Vec::new();
    let result = engine
        .sync_partition(&CommitsStream, &repo("acme/widgets"), &mut sink, true)
        .await;

    assert!(matches!(result, Err(crate::error::Error::HttpStatus { status: 404, .. })));
    let emitted = records(&sink);
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0]["hash"], json!("c2"));
    assert!(state.get_bookmark("commits", &repo("acme/widgets")).await.is_none());
}

#[tokio::test]
async fn test_silent_partition_writes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"uuid": "{1}", "full_name": "acme/a"}],
        })))
        .mount(&server)
        .await;

    let mut engine = engine(&server, None, StateManager::in_memory());
    let mut sink: Vec<Message> = Vec::new();
    let outcome = engine
        .sync_partition(&RepositoriesStream, &PartitionContext::new().with("workspace_id", "acme"), &mut sink, false)
        .await
        .unwrap();

    assert!(sink.is_empty());
    assert_eq!(outcome.records, 1);
    assert_eq!(outcome.child_contexts, vec![repo("acme/a")]);
}

#[tokio::test]
async fn test_missing_values_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "nope"})))
        .mount(&server)
        .await;

    let mut engine = engine(&server, None, StateManager::in_memory());
    let mut sink: Vec<Message> = Vec::new();
    let result = engine
        .sync_partition(&RepositoriesStream, &PartitionContext::new().with("workspace_id", "acme"), &mut sink, true)
        .await;

    assert!(matches!(result, Err(crate::error::Error::RecordExtraction { .. })));
}

#[tokio::test]
async fn test_unknown_placeholder_is_fatal() {
    let server = MockServer::start().await;
    let mut engine = engine(&server, None, StateManager::in_memory());

    let mut sink: Vec<Message> = Vec::new();
    let result = engine
        .sync_partition(&CommitsStream, &PartitionContext::new().with("workspace_id", "acme"), &mut sink, true)
        .await;

    assert!(matches!(result, Err(crate::error::Error::UndefinedVariable { .. })));
}

// ============================================================================
// Stream Sync Tests
// ============================================================================

#[tokio::test]
async fn test_sync_stream_emits_schema_records_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repositories/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                {"uuid": "{1}", "full_name": "acme/a"},
                {"uuid": "{2}", "full_name": "acme/b"},
            ],
        })))
        .mount(&server)
        .await;

    let mut engine = engine(&server, None, StateManager::in_memory());
    let mut sink: Vec<Message> = Vec::new();
    let partitions = vec![PartitionContext::new().with("workspace_id", "acme")];

    let children = engine
        .sync_stream(&RepositoriesStream, &partitions, &mut sink, true)
        .await
        .unwrap();

    assert_eq!(sink.len(), 4);
    assert!(sink[0].is_schema());
    assert!(sink[1].is_record());
    assert!(sink[2].is_record());
    assert!(sink[3].is_state());
    match &sink[1] {
        Message::Record { stream, record, .. } => {
            assert_eq!(stream, "repositories");
            assert_eq!(record["workspace_id"], json!("acme"));
        }
        other => panic!("expected record, got {other:?}"),
    }

    assert_eq!(
        children.partitions().unwrap(),
        vec![repo("acme/a"), repo("acme/b")]
    );
    assert_eq!(engine.stats().streams_synced, 1);
    assert_eq!(engine.stats().records_synced, 2);
}

#[tokio::test]
async fn test_sync_stream_silent_parent_dedups_children() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/workspaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"slug": "acme", "uuid": "{a}"}],
        })))
        .mount(&server)
        .await;

    let mut engine = engine(&server, None, StateManager::in_memory());
    let mut sink: Vec<Message> = Vec::new();
    let partitions = vec![
        PartitionContext::new().with("workspace", "acme"),
        PartitionContext::new().with("workspace", "acme-mirror"),
    ];

    let children = engine
        .sync_stream(&WorkspacesStream, &partitions, &mut sink, false)
        .await
        .unwrap();

    assert!(sink.is_empty());
    assert_eq!(children.len(), 1);
    assert_eq!(
        children.partitions().unwrap(),
        vec![PartitionContext::new().with("workspace_id", "acme")]
    );
}
