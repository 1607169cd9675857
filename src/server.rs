//! JSON HTTP API over the workflow catalog.
//!
//! Exposes the catalog to browsers, scripts, and other services. All
//! endpoints share one [`CatalogService`]: the snapshot is built lazily on
//! the first request that needs it and reused until `POST /reset`.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/status` | Snapshot state, without forcing a build |
//! | `GET`  | `/workflows` | List every indexed workflow |
//! | `GET`  | `/workflows/{id}` | One workflow's extracted metadata |
//! | `GET`  | `/workflows/{id}/raw` | The raw JSON definition from disk |
//! | `GET`  | `/workflows/{id}/plan` | The derived install plan |
//! | `POST` | `/search` | Ranked keyword search with tag filters |
//! | `POST` | `/reset` | Drop the snapshot; the next request rebuilds |
//!
//! # Error Contract
//!
//! All error responses use one schema:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "workflow not found: x.json" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `timeout` (408),
//! `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! catalog UIs.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::catalog::CatalogService;
use crate::config::Config;
use crate::models::{CatalogWorkflow, ScoredWorkflow, SearchRequest, WorkflowInstallPlan};
use crate::plan::build_install_plan;
use crate::search::search_catalog;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    service: Arc<CatalogService>,
}

/// Builds the API router around one catalog service.
///
/// Split out from [`run_server`] so tests can drive the routes in-process.
pub fn router(service: Arc<CatalogService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route("/workflows", get(handle_list_workflows))
        .route("/workflows/{id}", get(handle_get_workflow))
        .route("/workflows/{id}/raw", get(handle_get_raw))
        .route("/workflows/{id}/plan", get(handle_get_plan))
        .route("/search", post(handle_search))
        .route("/reset", post(handle_reset))
        .layer(cors)
        .with_state(AppState { service })
}

/// Starts the catalog HTTP server.
///
/// Binds to the address configured in `[server].bind` and serves until the
/// process is terminated. The catalog itself is built lazily by the first
/// request that needs it, so startup is immediate even over a large corpus.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let service = Arc::new(CatalogService::new(config.clone()));
    let app = router(service);

    println!("Catalog API listening on http://{}", bind_addr);
    info!(bind = %bind_addr, root = %config.catalog.root.display(), "serving workflow catalog");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Constructs a 408 Request Timeout error.
fn timeout_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::REQUEST_TIMEOUT,
        code: "timeout".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 Internal Server Error.
fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Inspects catalog errors and maps them to the most appropriate HTTP status.
/// This lets the catalog layer signal client errors (tampered id → 400,
/// unknown workflow → 404, build timeout → 408) without a custom error type.
fn classify_catalog_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    // "not found" must win over "invalid": those messages embed the decoded
    // path, which can itself contain "invalid".
    if msg.contains("not found") {
        not_found(msg)
    } else if msg.contains("invalid") {
        bad_request(msg)
    } else if msg.contains("timed out") {
        timeout_error(msg)
    } else {
        internal_error(msg)
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /status ============

/// JSON response body for `GET /status`.
#[derive(Serialize)]
struct StatusResponse {
    status: String,
    /// Whether a snapshot is currently published.
    indexed: bool,
    workflows: Option<usize>,
    skipped: Option<usize>,
    built_at: Option<String>,
}

/// Reports the snapshot state without triggering a build, so monitoring
/// never pays for indexing.
async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let response = match state.service.peek() {
        Some(snapshot) => StatusResponse {
            status: "ok".to_string(),
            indexed: true,
            workflows: Some(snapshot.workflows.len()),
            skipped: Some(snapshot.skipped.len()),
            built_at: Some(snapshot.built_at.to_rfc3339()),
        },
        None => StatusResponse {
            status: "ok".to_string(),
            indexed: false,
            workflows: None,
            skipped: None,
            built_at: None,
        },
    };
    Json(response)
}

// ============ GET /workflows ============

/// JSON response body for `GET /workflows`.
#[derive(Serialize)]
struct WorkflowListResponse {
    total: usize,
    workflows: Vec<CatalogWorkflow>,
}

async fn handle_list_workflows(
    State(state): State<AppState>,
) -> Result<Json<WorkflowListResponse>, AppError> {
    let snapshot = state
        .service
        .snapshot()
        .await
        .map_err(classify_catalog_error)?;

    Ok(Json(WorkflowListResponse {
        total: snapshot.workflows.len(),
        workflows: snapshot.workflows.clone(),
    }))
}

// ============ GET /workflows/{id} ============

async fn handle_get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogWorkflow>, AppError> {
    let workflow = state
        .service
        .workflow_by_id(&id)
        .await
        .map_err(classify_catalog_error)?;
    Ok(Json(workflow))
}

// ============ GET /workflows/{id}/raw ============

/// Serves the stored workflow definition byte for byte. The decoded path is
/// containment-checked before any disk access.
async fn handle_get_raw(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let raw = state
        .service
        .read_raw_by_id(&id)
        .await
        .map_err(classify_catalog_error)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], raw).into_response())
}

// ============ GET /workflows/{id}/plan ============

/// JSON response body for `GET /workflows/{id}/plan`.
#[derive(Serialize)]
struct PlanResponse {
    id: String,
    name: String,
    plan: WorkflowInstallPlan,
}

async fn handle_get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlanResponse>, AppError> {
    let workflow = state
        .service
        .workflow_by_id(&id)
        .await
        .map_err(classify_catalog_error)?;
    let plan = build_install_plan(&workflow);

    Ok(Json(PlanResponse {
        id: workflow.id,
        name: workflow.name,
        plan,
    }))
}

// ============ POST /search ============

/// JSON request body for `POST /search`.
///
/// `query` may be empty: every workflow then matches with a score of 1, in
/// crawl order. `limit` falls back to `[search].default_limit`.
#[derive(Deserialize)]
struct SearchBody {
    #[serde(default)]
    query: String,
    limit: Option<usize>,
    #[serde(default)]
    required_tags: Vec<String>,
}

/// JSON response body for `POST /search`.
#[derive(Serialize)]
struct SearchResponse {
    query: String,
    total: usize,
    results: Vec<ScoredWorkflow>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchResponse>, AppError> {
    let snapshot = state
        .service
        .snapshot()
        .await
        .map_err(classify_catalog_error)?;

    let request = SearchRequest {
        query: body.query.clone(),
        limit: body
            .limit
            .unwrap_or(state.service.config().search.default_limit),
        required_tags: body.required_tags,
    };
    let results = search_catalog(&snapshot, &request);

    Ok(Json(SearchResponse {
        query: body.query,
        total: results.len(),
        results,
    }))
}

// ============ POST /reset ============

/// JSON response body for `POST /reset`.
#[derive(Serialize)]
struct ResetResponse {
    status: String,
}

/// Drops the published snapshot. The next catalog request rebuilds from
/// disk, picking up files added or removed since the last build.
async fn handle_reset(State(state): State<AppState>) -> Json<ResetResponse> {
    state.service.reset();
    info!("catalog snapshot reset");
    Json(ResetResponse {
        status: "reset".to_string(),
    })
}
