//! HTTP JSON API over the task engine.
//!
//! Concurrency tokens travel as `ETag` on responses and are expected back as
//! `If-Match` on writes. The owner comes from the `X-Owner` header, falling
//! back to the configured default.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{Config, UiConfig};
use crate::db::Database;
use crate::error::{ErrorCode, TaskError};
use crate::tools::{get_enum, get_nullable_string, get_string, get_string_array, parse_due_value};
use crate::types::{ParentFilter, Status, TaskDraft, TaskFilter, TaskPatch, TaskRecord};

/// Header naming the acting owner.
pub const OWNER_HEADER: &str = "x-owner";

/// Shared state for handlers.
#[derive(Clone)]
pub struct DashboardServer {
    db: Arc<Database>,
    config: Arc<Config>,
}

impl DashboardServer {
    pub fn new(db: Arc<Database>, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    fn owner(&self, headers: &HeaderMap) -> String {
        headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.config.server.default_owner.clone())
    }
}

/// Error response: the structured `TaskError` body with a mapped status.
pub struct ApiError(pub TaskError);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(TaskError::from(err))
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        ApiError(err)
    }
}

/// HTTP status for each error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound | ErrorCode::UnknownTool => StatusCode::NOT_FOUND,
        ErrorCode::Conflict | ErrorCode::DeleteBlocked => StatusCode::CONFLICT,
        ErrorCode::InvalidOperation | ErrorCode::CycleRejected => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.code);
        if status.is_server_error() {
            warn!(code = self.0.code.as_str(), error = %self.0.message, "API request failed");
        }
        (status, Json(self.0)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Quote a token for the `ETag` header.
fn etag_header(etag: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("\"{}\"", etag))
        .unwrap_or_else(|_| HeaderValue::from_static("\"\""))
}

/// Read the expected token from `If-Match`, accepting quoted or weak forms.
fn if_match(headers: &HeaderMap) -> ApiResult<String> {
    headers
        .get(header::IF_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().trim_start_matches("W/").trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError(TaskError::missing_field("etag").with_details("send the task's ETag in If-Match")))
}

fn with_etag(status: StatusCode, record: TaskRecord) -> Response {
    let tag = etag_header(&record.etag);
    (status, [(header::ETAG, tag)], Json(record)).into_response()
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, serde::Deserialize)]
struct ListParams {
    status: Option<String>,
    /// Parent task ID, or `null` / `root` for root tasks.
    parent: Option<String>,
    limit: Option<u32>,
}

async fn list_tasks(
    State(state): State<DashboardServer>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let owner = state.owner(&headers);
    let filter = TaskFilter {
        status: params
            .status
            .as_deref()
            .map(str::parse::<Status>)
            .transpose()?,
        parent: params.parent.map(|p| match p.as_str() {
            "null" | "root" => ParentFilter::Root,
            _ => ParentFilter::Of(p),
        }),
        limit: params.limit.filter(|l| *l > 0),
    };

    let tasks = state.db.list_tasks(&owner, &filter)?;
    Ok(Json(json!({ "tasks": tasks })))
}

async fn create_task(
    State(state): State<DashboardServer>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let owner = state.owner(&headers);
    let title = get_string(&body, "title").ok_or_else(|| TaskError::missing_field("title"))?;
    let due_date = match body.get("due_date") {
        None | Some(Value::Null) => None,
        Some(v) => Some(parse_due_value(v)?),
    };

    let draft = TaskDraft {
        id: get_string(&body, "id"),
        title,
        description: get_string(&body, "description"),
        status: get_enum(&body, "status")?,
        priority: get_enum(&body, "priority")?,
        due_date,
        parent_id: get_string(&body, "parent_id"),
    };

    let record = state.db.create_task(&owner, draft)?;
    Ok(with_etag(StatusCode::CREATED, record))
}

async fn get_task(
    State(state): State<DashboardServer>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> ApiResult<Response> {
    let owner = state.owner(&headers);
    let record = state.db.require_task(&task_id, &owner)?;
    Ok(with_etag(StatusCode::OK, record))
}

async fn update_task(
    State(state): State<DashboardServer>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let owner = state.owner(&headers);
    let expected = if_match(&headers)?;

    let due_date = match body.get("due_date") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(v) => Some(Some(parse_due_value(v)?)),
    };

    let patch = TaskPatch {
        title: get_string(&body, "title"),
        description: get_nullable_string(&body, "description"),
        status: get_enum(&body, "status")?,
        priority: get_enum(&body, "priority")?,
        due_date,
        parent_id: get_nullable_string(&body, "parent_id"),
    };

    let record = state.db.update_task(&task_id, &owner, &expected, patch)?;
    Ok(with_etag(StatusCode::OK, record))
}

async fn delete_task(
    State(state): State<DashboardServer>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> ApiResult<StatusCode> {
    let owner = state.owner(&headers);
    let expected = if_match(&headers)?;
    state.db.delete_task(&task_id, &owner, &expected)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn promote_task(
    State(state): State<DashboardServer>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> ApiResult<Response> {
    let owner = state.owner(&headers);
    let expected = if_match(&headers)?;
    let record = state.db.promote_task(&task_id, &owner, &expected)?;
    Ok(with_etag(StatusCode::OK, record))
}

async fn breakdown_task(
    State(state): State<DashboardServer>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let owner = state.owner(&headers);
    let titles =
        get_string_array(&body, "titles").ok_or_else(|| TaskError::missing_field("titles"))?;

    let tasks = state
        .db
        .breakdown_task(&task_id, &owner, &titles, &state.config.tasks)?;
    Ok((StatusCode::CREATED, Json(json!({ "parent": task_id, "tasks": tasks }))))
}

async fn task_tree(
    State(state): State<DashboardServer>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let owner = state.owner(&headers);
    let tree = state
        .db
        .get_task_tree(&task_id, &owner)?
        .ok_or_else(|| TaskError::task_not_found(&task_id))?;
    Ok(Json(serde_json::to_value(tree).map_err(anyhow::Error::from)?))
}

async fn next_task(
    State(state): State<DashboardServer>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let owner = state.owner(&headers);
    let task = state.db.select_next(&owner)?;
    Ok(Json(json!({ "task": task })))
}

async fn stats(State(state): State<DashboardServer>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let owner = state.owner(&headers);
    let stats = state.db.task_stats(&owner)?;
    Ok(Json(json!(stats)))
}

/// Build the router with all routes.
pub fn build_router(state: DashboardServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::ETAG]);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/promote", post(promote_task))
        .route("/api/tasks/{id}/breakdown", post(breakdown_task))
        .route("/api/tasks/{id}/tree", get(task_tree))
        .route("/api/next", get(next_task))
        .route("/api/stats", get(stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Status of the HTTP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardStatus {
    Running,
    /// Bind failed; retrying in the background.
    Retrying,
    Stopped,
}

/// Handle for managing the HTTP server lifecycle.
pub struct DashboardHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    status_rx: watch::Receiver<DashboardStatus>,
}

impl DashboardHandle {
    pub fn status(&self) -> DashboardStatus {
        *self.status_rx.borrow()
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Bind on 127.0.0.1 and serve until the returned sender fires.
///
/// Port 0 picks a free port; the bound address is returned.
pub async fn start_server(
    db: Arc<Database>,
    config: Arc<Config>,
    port: u16,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(DashboardServer::new(db, config));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("HTTP API listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("HTTP API shutting down");
            })
            .await
        {
            // The MCP server keeps running without the HTTP API.
            tracing::error!("HTTP API error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

/// Retry delay with ± jitter derived from the clock's sub-second nanos.
fn compute_jittered_delay(base_ms: u64, jitter_ms: u64) -> Duration {
    let nanos = chrono::Utc::now().timestamp_subsec_nanos() as i64;
    let span = (jitter_ms * 2) as i64;
    let jitter = if span > 0 {
        nanos % span - jitter_ms as i64
    } else {
        0
    };

    Duration::from_millis((base_ms as i64 + jitter).max(1000) as u64)
}

/// Start the HTTP server, retrying with exponential backoff while the port
/// is unavailable. Never fails; check the handle's status.
pub fn start_server_with_retry(
    db: Arc<Database>,
    config: Arc<Config>,
    ui: &UiConfig,
) -> DashboardHandle {
    let UiConfig {
        port,
        retry_initial_ms,
        retry_jitter_ms,
        retry_max_ms,
        retry_multiplier,
        ..
    } = *ui;

    let (status_tx, status_rx) = watch::channel(DashboardStatus::Retrying);
    let (handle_shutdown_tx, mut handle_shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut current_delay_ms = retry_initial_ms;

        loop {
            match handle_shutdown_rx.try_recv() {
                Ok(()) | Err(oneshot::error::TryRecvError::Closed) => {
                    let _ = status_tx.send(DashboardStatus::Stopped);
                    break;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
            }

            match start_server(Arc::clone(&db), Arc::clone(&config), port).await {
                Ok((server_shutdown_tx, bound_addr)) => {
                    info!("HTTP API available at http://{}", bound_addr);
                    let _ = status_tx.send(DashboardStatus::Running);

                    let _ = handle_shutdown_rx.await;
                    let _ = server_shutdown_tx.send(());
                    let _ = status_tx.send(DashboardStatus::Stopped);
                    break;
                }
                Err(e) => {
                    warn!(
                        port,
                        error = %e,
                        retry_in_ms = current_delay_ms,
                        "Failed to start HTTP API, retrying"
                    );
                    let _ = status_tx.send(DashboardStatus::Retrying);

                    tokio::time::sleep(compute_jittered_delay(current_delay_ms, retry_jitter_ms))
                        .await;

                    current_delay_ms =
                        ((current_delay_ms as f64 * retry_multiplier) as u64).min(retry_max_ms);
                }
            }
        }
    });

    DashboardHandle {
        shutdown_tx: Some(handle_shutdown_tx),
        status_rx,
    }
}
