//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorResponse, StoreError};
use crate::metrics;
use crate::records::{self, Row, Table, COMPLETED_COLUMN};
use crate::store::{IsFilter, TableStore};

/// Greeting returned by the root route.
pub const WELCOME_MESSAGE: &str = "Welcome to FundX backend!";

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database handle shared by every request.
    store: Arc<dyn TableStore>,
}

impl AppState {
    /// Create state around a shared store handle.
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Create state owning `store`.
    pub fn from_store<S: TableStore + 'static>(store: S) -> Self {
        Self::new(Arc::new(store))
    }

    /// The database handle.
    pub fn store(&self) -> &dyn TableStore {
        self.store.as_ref()
    }
}

/// Welcome response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Greeting text.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: String,
}

/// Root handler.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Greeting", body = MessageResponse))
)]
pub async fn welcome() -> impl IntoResponse {
    Json(MessageResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

/// Health check handler - always returns 200.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Process is up", body = HealthResponse))
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// List projects that are still raising funds.
#[utoipa::path(
    get,
    path = "/projects",
    responses(
        (status = 200, description = "Array of projects whose is_completed flag is false"),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Row>>, ApiError> {
    let filter = IsFilter::new(COMPLETED_COLUMN, false);
    let projects = state.store().select(Table::Projects, &filter).await?;
    Ok(Json(projects))
}

/// Create a project.
#[utoipa::path(
    post,
    path = "/create-project",
    request_body(content = Object, content_type = "application/json"),
    responses(
        (status = 201, description = "The stored project record"),
        (status = 400, description = "A required key is missing", body = ErrorResponse),
        (status = 500, description = "Invalid body or database failure", body = ErrorResponse)
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    require_json(&headers)?;
    let record = create_record(&state, Table::Projects, &body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Record a contribution.
#[utoipa::path(
    post,
    path = "/contribute",
    request_body(content = Object, content_type = "application/json"),
    responses(
        (status = 201, description = "The stored contribution record"),
        (status = 400, description = "A required key is missing", body = ErrorResponse),
        (status = 500, description = "Invalid body or database failure", body = ErrorResponse)
    )
)]
pub async fn create_contribution(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    require_json(&headers)?;
    let record = create_record(&state, Table::Contributions, &body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Reject creation requests that do not declare a JSON body.
fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let is_json = mime == "application/json"
        || (mime.starts_with("application/") && mime.ends_with("+json"));

    if is_json {
        Ok(())
    } else {
        warn!(content_type, "Rejected creation request without a JSON body");
        Err(ApiError::InvalidBody(format!(
            "expected Content-Type application/json, got {:?}",
            content_type
        )))
    }
}

/// Validate `body` for `table`, insert it and return the stored row.
async fn create_record(state: &AppState, table: Table, body: &[u8]) -> Result<Row, ApiError> {
    let row = records::parse_payload(table, body).inspect_err(|e| match e {
        ApiError::MissingFields { missing, .. } => {
            metrics::inc_validation_rejections(table);
            warn!(%table, ?missing, "Rejected payload with missing fields");
        }
        ApiError::InvalidBody(reason) => {
            metrics::inc_validation_rejections(table);
            warn!(%table, %reason, "Rejected undecodable payload");
        }
        ApiError::Store(_) => {}
    })?;

    let record = state
        .store()
        .insert(table, row)
        .await?
        .into_iter()
        .next()
        .ok_or(StoreError::EmptyInsert { table })?;

    metrics::inc_records_created(table);
    info!(%table, id = ?record.get("id"), "Record created");

    Ok(record)
}
