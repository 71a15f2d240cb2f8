//! Integration tests for the HTTP surface.
//!
//! These tests start a real server and talk to it with an HTTP client,
//! covering every route end to end.

use gridbase_store::server::{ErrorResponse, ServerConfig, SheetServer, StatusResponse};
use gridbase_store::service::SheetSnapshot;
use gridbase_store::storage::{MemorySheetStore, SheetStore, StoreError, StoreResult};
use gridbase_store::{CellDocument, CellValue, MetaDocument};
use serde_json::json;
use std::sync::Arc;
use tokio::time::Duration;

/// Find a free port for testing.
async fn free_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Start a server over `store` on a free port, return its base URL.
async fn start_server_with(store: Arc<dyn SheetStore>, index_page: Option<std::path::PathBuf>) -> String {
    let port = free_port().await;
    let config = ServerConfig {
        bind_addr: format!("127.0.0.1:{port}"),
        storage_path: None,
        index_page,
    };
    let server = SheetServer::with_store(config, store);
    tokio::spawn(async move {
        server.run().await.unwrap();
    });
    // Give server time to bind
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}")
}

async fn start_test_server() -> String {
    start_server_with(Arc::new(MemorySheetStore::new()), None).await
}

async fn load(client: &reqwest::Client, base: &str) -> SheetSnapshot {
    client
        .get(format!("{base}/load-cells"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn post_json(
    client: &reqwest::Client,
    base: &str,
    path: &str,
    body: serde_json::Value,
) -> reqwest::Response {
    client
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_load_cells_defaults() {
    let base = start_test_server().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .get(format!("{base}/load-cells"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"cells": {}, "rows": 10, "columns": 10}));
}

#[tokio::test]
async fn test_update_cell_roundtrip() {
    let base = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = post_json(&client, &base, "/update-cell", json!({"cell_id": "A1", "value": 5})).await;
    assert_eq!(resp.status(), 200);
    let status: StatusResponse = resp.json().await.unwrap();
    assert_eq!(status.status, "success");

    post_json(&client, &base, "/update-cell", json!({"cell_id": "B2", "value": "hello"})).await;

    let snapshot = load(&client, &base).await;
    assert_eq!(snapshot.cells.len(), 2);
    assert_eq!(snapshot.cells["A1"], CellValue::from(5));
    assert_eq!(snapshot.cells["B2"], CellValue::from("hello"));
}

#[tokio::test]
async fn test_update_cell_last_write_wins() {
    let store = Arc::new(MemorySheetStore::new());
    let base = start_server_with(store.clone(), None).await;
    let client = reqwest::Client::new();

    post_json(&client, &base, "/update-cell", json!({"cell_id": "C3", "value": "old"})).await;
    post_json(&client, &base, "/update-cell", json!({"cell_id": "C3", "value": "new"})).await;

    assert_eq!(store.cells().unwrap(), vec![CellDocument::new("C3", "new")]);
    assert_eq!(load(&client, &base).await.cells["C3"], CellValue::from("new"));
}

#[tokio::test]
async fn test_delete_all_keeps_meta() {
    let base = start_test_server().await;
    let client = reqwest::Client::new();

    post_json(&client, &base, "/update-meta", json!({"rows": 20, "columns": 15})).await;
    post_json(&client, &base, "/update-cell", json!({"cell_id": "A1", "value": 1})).await;
    post_json(&client, &base, "/update-cell", json!({"cell_id": "A2", "value": 2})).await;

    let resp = client.post(format!("{base}/delete-all")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let status: StatusResponse = resp.json().await.unwrap();
    assert_eq!(status.status, "all_deleted");

    let snapshot = load(&client, &base).await;
    assert!(snapshot.cells.is_empty());
    assert_eq!((snapshot.rows, snapshot.columns), (20, 15));
}

#[tokio::test]
async fn test_update_meta() {
    let base = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = post_json(&client, &base, "/update-meta", json!({"rows": 20, "columns": 15})).await;
    assert_eq!(resp.status(), 200);
    let status: StatusResponse = resp.json().await.unwrap();
    assert_eq!(status.status, "meta_updated");

    let snapshot = load(&client, &base).await;
    assert_eq!((snapshot.rows, snapshot.columns), (20, 15));

    // Absent fields are unset and fall back to defaults on read
    post_json(&client, &base, "/update-meta", json!({"rows": 30})).await;
    let snapshot = load(&client, &base).await;
    assert_eq!((snapshot.rows, snapshot.columns), (30, 10));
}

#[tokio::test]
async fn test_export_csv() {
    let base = start_test_server().await;
    let client = reqwest::Client::new();

    post_json(&client, &base, "/update-cell", json!({"cell_id": "A1", "value": 5})).await;
    post_json(&client, &base, "/update-cell", json!({"cell_id": "B2", "value": "hello"})).await;

    let resp = client.get(format!("{base}/export")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let disposition = resp.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("spreadsheet.csv"));

    let text = resp.text().await.unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Cell ID,Value"));
    let mut rows: Vec<&str> = lines.collect();
    rows.sort();
    assert_eq!(rows, vec!["A1,5", "B2,hello"]);
}

#[tokio::test]
async fn test_malformed_update_cell_is_rejected() {
    let store = Arc::new(MemorySheetStore::new());
    let base = start_server_with(store.clone(), None).await;
    let client = reqwest::Client::new();

    for body in [
        json!({"value": 1}),
        json!({"cell_id": "A1"}),
        json!({"cell_id": "A1", "value": null}),
        json!({"cell_id": "", "value": 1}),
        json!({"cell_id": "A1", "value": {"nested": true}}),
    ] {
        let resp = post_json(&client, &base, "/update-cell", body).await;
        assert_eq!(resp.status(), 400);
        let err: ErrorResponse = resp.json().await.unwrap();
        assert_eq!(err.status, "error");
        assert!(!err.message.is_empty());
    }

    let resp = client
        .post(format!("{base}/update-cell"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn test_malformed_update_meta_is_rejected() {
    let base = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = post_json(&client, &base, "/update-meta", json!({"rows": -3})).await;
    assert_eq!(resp.status(), 400);

    let snapshot = load(&client, &base).await;
    assert_eq!((snapshot.rows, snapshot.columns), (10, 10));
}

/// Store whose every call fails, as if the database were unreachable.
struct DownStore;

impl SheetStore for DownStore {
    fn cells(&self) -> StoreResult<Vec<CellDocument>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn meta(&self) -> StoreResult<Option<MetaDocument>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn upsert_cell(&self, _: &str, _: &CellValue) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn delete_cells(&self) -> StoreResult<u64> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn upsert_meta(&self, _: &MetaDocument) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn test_store_failure_is_server_error() {
    let base = start_server_with(Arc::new(DownStore), None).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/load-cells")).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    let err: ErrorResponse = resp.json().await.unwrap();
    assert!(err.message.contains("connection refused"));

    let resp = post_json(&client, &base, "/update-cell", json!({"cell_id": "A1", "value": 1})).await;
    assert_eq!(resp.status(), 500);

    let resp = client.post(format!("{base}/delete-all")).send().await.unwrap();
    assert_eq!(resp.status(), 500);

    let resp = post_json(&client, &base, "/update-meta", json!({"rows": 1, "columns": 1})).await;
    assert_eq!(resp.status(), 500);

    let resp = client.get(format!("{base}/export")).send().await.unwrap();
    assert_eq!(resp.status(), 500);

    // Input is validated before the store is touched
    let resp = post_json(&client, &base, "/update-cell", json!({"cell_id": "A1"})).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_index_page() {
    let base = start_test_server().await;
    let resp = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers()["content-type"].to_str().unwrap().starts_with("text/html"));
    assert!(resp.text().await.unwrap().contains("/load-cells"));
}

#[tokio::test]
async fn test_index_page_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("index.html");
    std::fs::write(&page, "<html><body>custom grid</body></html>").unwrap();

    let base = start_server_with(Arc::new(MemorySheetStore::new()), Some(page)).await;
    let body = reqwest::get(format!("{base}/")).await.unwrap().text().await.unwrap();
    assert_eq!(body, "<html><body>custom grid</body></html>");
}

#[tokio::test]
async fn test_index_page_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let base = start_server_with(
        Arc::new(MemorySheetStore::new()),
        Some(dir.path().join("missing.html")),
    )
    .await;
    let resp = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(resp.status(), 500);
}
