//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the catalog service and test
//! full runs end-to-end, from snapshot load to snapshot write.

use emote_sniper::config::{Config, EndpointEntry, OutputConfig, QueryConfig};
use emote_sniper::crawler::Coordinator;
use emote_sniper::state::CatalogRecord;
use emote_sniper::storage::{JsonStorage, Storage};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const CATALOG_PATH: &str = "/v1/search/items";

/// Matches requests that carry no `cursor` parameter (first pages)
struct FirstPage;

impl Match for FirstPage {
    fn matches(&self, request: &Request) -> bool {
        request.url.query_pairs().all(|(key, _)| key != "cursor")
    }
}

/// Creates a test configuration with short delays and the given endpoints
fn create_test_config(endpoints: &[String], snapshot_path: &Path) -> Config {
    let mut config = Config {
        output: OutputConfig {
            snapshot_path: snapshot_path.display().to_string(),
        },
        endpoints: endpoints
            .iter()
            .map(|base_url| EndpointEntry {
                base_url: base_url.clone(),
            })
            .collect(),
        queries: vec![
            QueryConfig::new("recent", &[("limit", "120"), ("sortType", "3")]),
            QueryConfig::new("bestselling", &[("limit", "120"), ("sortType", "2")]),
        ],
        ..Config::default()
    };
    config.crawler.page_delay_ms = 0;
    config.crawler.config_delay_ms = 0;
    config.crawler.rate_limit_delay_ms = 10;
    config
}

/// Answers liveness probes (smallest page size) with an empty page
async fn mount_probe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(server)
        .await;
}

/// Mounts a page for one sort order; `cursor` selects which page it answers
async fn mount_page(
    server: &MockServer,
    sort_type: &str,
    cursor: Option<&str>,
    body: serde_json::Value,
) {
    let mock = Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .and(query_param("limit", "120"))
        .and(query_param("sortType", sort_type));

    let mock = match cursor {
        Some(cursor) => mock.and(query_param("cursor", cursor)),
        None => mock.and(FirstPage),
    };

    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Standard upstream: two pages for "recent", one page for "bestselling"
/// that repeats an item already seen under "recent"
async fn mount_standard_catalog(server: &MockServer) {
    mount_probe(server).await;
    mount_page(
        server,
        "3",
        None,
        json!({
            "data": [
                { "id": 42, "name": " Wave \n Hi " },
                { "id": 0, "name": "Broken" },
                { "id": 43, "name": "" }
            ],
            "nextPageCursor": "page2"
        }),
    )
    .await;
    mount_page(
        server,
        "3",
        Some("page2"),
        json!({
            "data": [ { "id": 44, "name": "Salute" } ],
            "nextPageCursor": null
        }),
    )
    .await;
    mount_page(
        server,
        "2",
        None,
        json!({
            "data": [
                { "id": 44, "name": "Salute" },
                { "id": 45, "name": "Cheer" }
            ]
        }),
    )
    .await;
}

fn ids(records: &[CatalogRecord]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
}

#[tokio::test]
async fn test_full_crawl_from_empty_state() {
    let server = MockServer::start().await;
    mount_standard_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("EmoteSniper.json");
    let config = create_test_config(&[server.uri()], &snapshot_path);

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(
        report.new_records,
        vec![
            CatalogRecord::new(42, "Wave Hi"),
            CatalogRecord::new(43, "Emote_43"),
            CatalogRecord::new(44, "Salute"),
            CatalogRecord::new(45, "Cheer"),
        ]
    );
    assert_eq!(report.stats.pages_scanned, 3);
    assert_eq!(report.stats.configs_scanned, 2);
    assert_eq!(report.stats.errors, 0);

    // The file on disk matches the report
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshot_path).unwrap()).unwrap();
    assert!(raw["keyword"].is_null());
    assert_eq!(raw["totalItems"], 4);
    assert_eq!(raw["data"][0], json!({ "id": 42, "name": "Wave Hi" }));
    let stamp = raw["lastUpdate"].as_str().unwrap();
    assert_eq!(stamp.len(), "2024-01-01T00:00:00.000Z".len());
    assert!(stamp.ends_with('Z'));
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    mount_standard_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("EmoteSniper.json");
    let config = create_test_config(&[server.uri()], &snapshot_path);

    let first = Coordinator::new(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap();
    let second = Coordinator::new(config).unwrap().run().await.unwrap();

    assert!(second.new_records.is_empty());
    assert_eq!(second.snapshot.data, first.snapshot.data);
    assert_eq!(second.snapshot.total_items, first.snapshot.total_items);
    assert_eq!(second.prior_total, first.snapshot.total_items);
    assert!(second.snapshot.last_update >= first.snapshot.last_update);
}

#[tokio::test]
async fn test_new_records_are_prepended_to_prior_snapshot() {
    let server = MockServer::start().await;
    mount_probe(&server).await;
    mount_page(
        &server,
        "3",
        None,
        json!({ "data": [ { "id": 2, "name": "B" }, { "id": 1, "name": "A" } ] }),
    )
    .await;
    mount_page(&server, "2", None, json!({ "data": [] })).await;

    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("EmoteSniper.json");
    std::fs::write(
        &snapshot_path,
        r#"{"keyword":null,"totalItems":2,"lastUpdate":"2024-01-01T00:00:00.000Z",
            "data":[{"id":2,"name":"B"},{"id":3,"name":"C"}]}"#,
    )
    .unwrap();

    let config = create_test_config(&[server.uri()], &snapshot_path);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.new_records, vec![CatalogRecord::new(1, "A")]);
    assert_eq!(ids(&report.snapshot.data), vec![1, 2, 3]);
    assert_eq!(report.snapshot.total_items, 3);
    assert!(report.snapshot.total_items >= report.prior_total);
    assert!(report.snapshot.duplicate_ids().is_empty());
}

#[tokio::test]
async fn test_legacy_snapshot_is_upgraded() {
    let server = MockServer::start().await;
    mount_probe(&server).await;
    mount_page(&server, "3", None, json!({ "data": [ { "id": 7, "name": "Dance" } ] })).await;
    mount_page(&server, "2", None, json!({ "data": [] })).await;

    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("EmoteSniper.json");
    std::fs::write(
        &snapshot_path,
        r#"{"lastUpdated":"2023-05-01T08:00:00.000001","totalEmotes":1,
            "data":[{"id":5,"name":"Salute"}]}"#,
    )
    .unwrap();

    let config = create_test_config(&[server.uri()], &snapshot_path);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();
    assert_eq!(ids(&report.snapshot.data), vec![7, 5]);

    let raw = std::fs::read_to_string(&snapshot_path).unwrap();
    assert!(raw.contains("\"totalItems\": 2"));
    assert!(raw.contains("\"lastUpdate\""));
    assert!(!raw.contains("lastUpdated"));
    assert!(!raw.contains("totalEmotes"));
}

#[tokio::test]
async fn test_corrupt_snapshot_treated_as_empty() {
    let server = MockServer::start().await;
    mount_probe(&server).await;
    mount_page(&server, "3", None, json!({ "data": [ { "id": 7, "name": "Dance" } ] })).await;
    mount_page(&server, "2", None, json!({ "data": [] })).await;

    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("EmoteSniper.json");
    std::fs::write(&snapshot_path, "{ \"data\": [ {\"id\": ").unwrap();

    let config = create_test_config(&[server.uri()], &snapshot_path);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.prior_total, 0);
    assert_eq!(report.snapshot.data, vec![CatalogRecord::new(7, "Dance")]);

    let reloaded = JsonStorage::new(&snapshot_path).load();
    assert_eq!(reloaded.data, report.snapshot.data);
}

#[tokio::test]
async fn test_run_with_nothing_new_still_saves() {
    let server = MockServer::start().await;
    mount_probe(&server).await;
    mount_page(&server, "3", None, json!({ "data": [ { "id": 5, "name": "Salute" } ] })).await;
    mount_page(&server, "2", None, json!({ "data": [] })).await;

    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("EmoteSniper.json");
    std::fs::write(
        &snapshot_path,
        r#"{"keyword":null,"totalItems":1,"lastUpdate":"2020-01-01T00:00:00.000Z",
            "data":[{"id":5,"name":"Salute"}]}"#,
    )
    .unwrap();

    let config = create_test_config(&[server.uri()], &snapshot_path);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert!(report.new_records.is_empty());
    let raw = std::fs::read_to_string(&snapshot_path).unwrap();
    assert!(!raw.contains("2020-01-01T00:00:00.000Z"));
}

#[tokio::test]
async fn test_first_endpoint_dead_second_used() {
    let dead = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&dead)
        .await;

    let live = MockServer::start().await;
    mount_standard_catalog(&live).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &[dead.uri(), live.uri()],
        &dir.path().join("EmoteSniper.json"),
    );

    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.endpoint, live.uri());
    assert_eq!(report.stats.pages_for(&dead.uri()), 0);
    assert_eq!(report.stats.pages_for(&live.uri()), 3);
    assert_eq!(report.new_records.len(), 4);
}

#[tokio::test]
async fn test_service_unavailable_fails_over() {
    let primary = MockServer::start().await;
    mount_probe(&primary).await;
    Mock::given(method("GET"))
        .and(query_param("limit", "120"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&primary)
        .await;

    let backup = MockServer::start().await;
    mount_standard_catalog(&backup).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &[primary.uri(), backup.uri()],
        &dir.path().join("EmoteSniper.json"),
    );

    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.endpoint, backup.uri());
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.pages_for(&primary.uri()), 0);
    assert_eq!(report.stats.pages_for(&backup.uri()), 3);
    assert_eq!(ids(&report.new_records), vec![42, 43, 44, 45]);
}

#[tokio::test]
async fn test_service_unavailable_without_alternative_keeps_endpoint() {
    let server = MockServer::start().await;
    mount_probe(&server).await;
    Mock::given(method("GET"))
        .and(query_param("limit", "120"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&[server.uri()], &dir.path().join("EmoteSniper.json"));
    config.crawler.max_pages_per_config = 2;

    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.endpoint, server.uri());
    // Two attempts per configuration, each ending in 503
    assert_eq!(report.stats.errors, 4);
    assert_eq!(report.stats.pages_scanned, 0);
    assert!(report.new_records.is_empty());
}

#[tokio::test]
async fn test_rate_limited_page_is_retried() {
    let server = MockServer::start().await;
    mount_probe(&server).await;
    Mock::given(method("GET"))
        .and(query_param("limit", "120"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "3", None, json!({ "data": [ { "id": 11, "name": "Bow" } ] })).await;
    mount_page(&server, "2", None, json!({ "data": [] })).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[server.uri()], &dir.path().join("EmoteSniper.json"));

    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stats.rate_limited, 2);
    assert_eq!(report.stats.errors, 0);
    assert_eq!(report.new_records, vec![CatalogRecord::new(11, "Bow")]);
}
