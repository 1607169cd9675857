use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use flow_catalog::catalog::CatalogService;
use flow_catalog::config::{BuildConfig, CatalogConfig, Config, SearchConfig, ServerConfig};
use flow_catalog::ids;
use flow_catalog::server;

fn test_config(root: &Path) -> Config {
    Config {
        catalog: CatalogConfig {
            root: root.to_path_buf(),
            include_globs: vec!["**/*.json".to_string()],
            exclude_globs: Vec::new(),
        },
        build: BuildConfig::default(),
        search: SearchConfig::default(),
        server: ServerConfig::default(),
    }
}

fn setup_corpus() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("a")).unwrap();
    fs::create_dir_all(tmp.path().join("b")).unwrap();

    fs::write(
        tmp.path().join("a/pipeline.json"),
        r#"{
  "name": "Data Pipeline",
  "nodes": [
    { "name": "Transform", "type": "n8n-nodes-base.code", "parameters": {} },
    { "name": "Store", "type": "n8n-nodes-base.postgres", "parameters": {} }
  ]
}
"#,
    )
    .unwrap();

    fs::write(
        tmp.path().join("b/slack.json"),
        r##"{
  "name": "Slack Notifier",
  "nodes": [
    { "name": "Webhook", "type": "n8n-nodes-base.webhook", "parameters": { "path": "notify" } },
    {
      "name": "Send to Slack",
      "type": "n8n-nodes-base.slack",
      "parameters": { "channel": "#alerts" },
      "credentials": { "slackApi": { "name": "Slack account" } }
    }
  ]
}
"##,
    )
    .unwrap();

    tmp
}

/// Binds the API router on an ephemeral port and serves it in the background.
async fn spawn_server(root: &Path) -> String {
    let service = Arc::new(CatalogService::new(test_config(root)));
    let app = server::router(service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn health_reports_ok_and_version() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn status_flips_after_first_catalog_request() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;

    let before: Value = reqwest::get(format!("{}/status", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before["indexed"], false, "no build before first use");

    reqwest::get(format!("{}/workflows", base)).await.unwrap();

    let after: Value = reqwest::get(format!("{}/status", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["indexed"], true);
    assert_eq!(after["workflows"], 2);
}

#[tokio::test]
async fn list_workflows_in_crawl_order() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;

    let body: Value = reqwest::get(format!("{}/workflows", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["workflows"][0]["relative_path"], "a/pipeline.json");
    assert_eq!(body["workflows"][1]["relative_path"], "b/slack.json");
}

#[tokio::test]
async fn get_workflow_and_plan_by_id() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;
    let id = ids::encode_workflow_id("b/slack.json");

    let workflow: Value = reqwest::get(format!("{}/workflows/{}", base, id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(workflow["name"], "Slack Notifier");
    assert_eq!(workflow["complexity"], "low");

    let plan: Value = reqwest::get(format!("{}/workflows/{}/plan", base, id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(plan["name"], "Slack Notifier");
    assert_eq!(plan["plan"]["credential_checklist"][0], "slackApi");
    assert_eq!(plan["plan"]["install_steps"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn raw_returns_stored_json() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;
    let id = ids::encode_workflow_id("b/slack.json");

    let response = reqwest::get(format!("{}/workflows/{}/raw", base, id))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        "application/json"
    );

    let expected = fs::read_to_string(tmp.path().join("b/slack.json")).unwrap();
    assert_eq!(response.text().await.unwrap(), expected);
}

#[tokio::test]
async fn tampered_id_is_bad_request() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;

    let response = reqwest::get(format!("{}/workflows/{}", base, "!!!not-an-id!!!"))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("invalid workflow id"),
        "got: {}",
        body
    );
}

#[tokio::test]
async fn escaping_id_is_bad_request_on_raw() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;
    let id = ids::encode_workflow_id("../outside.json");

    let response = reqwest::get(format!("{}/workflows/{}/raw", base, id))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;
    let id = ids::encode_workflow_id("ghost.json");

    let response = reqwest::get(format!("{}/workflows/{}", base, id))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn unknown_id_whose_path_contains_invalid_is_still_not_found() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;
    let id = ids::encode_workflow_id("invalid-orders.json");

    let response = reqwest::get(format!("{}/workflows/{}", base, id))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("workflow not found"),
        "got: {}",
        body
    );
}

#[tokio::test]
async fn search_ranks_and_filters() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/search", base))
        .json(&serde_json::json!({ "query": "slack" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["name"], "Slack Notifier");
    assert!(body["results"][0]["score"].as_i64().unwrap() > 1);

    let filtered: Value = client
        .post(format!("{}/search", base))
        .json(&serde_json::json!({ "query": "", "required_tags": ["slack"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered["total"], 1);
    assert_eq!(filtered["results"][0]["name"], "Slack Notifier");
}

#[tokio::test]
async fn search_with_empty_body_lists_everything_tied() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/search", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["results"][0]["score"], 1);
    assert_eq!(body["results"][1]["score"], 1);
    assert_eq!(body["results"][0]["relative_path"], "a/pipeline.json");
}

#[tokio::test]
async fn reset_drops_snapshot_and_rebuild_sees_new_files() {
    let tmp = setup_corpus();
    let base = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();

    reqwest::get(format!("{}/workflows", base)).await.unwrap();

    fs::write(
        tmp.path().join("c.json"),
        r#"{ "name": "Late Arrival", "nodes": [] }"#,
    )
    .unwrap();

    let reset: Value = client
        .post(format!("{}/reset", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reset["status"], "reset");

    let status: Value = reqwest::get(format!("{}/status", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["indexed"], false);

    let body: Value = reqwest::get(format!("{}/workflows", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 3);
}
