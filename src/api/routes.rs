//! HTTP API route definitions.

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::cors::with_cors;
use super::handlers::{
    self, create_contribution, create_project, health, list_projects, welcome, AppState,
};
use crate::error::ErrorResponse;
use crate::metrics::track_http;

/// OpenAPI description of the public routes.
#[derive(OpenApi)]
#[openapi(
    info(title = "FundX backend", description = "Projects and contributions for FundX"),
    paths(
        handlers::welcome,
        handlers::health,
        handlers::list_projects,
        handlers::create_project,
        handlers::create_contribution
    ),
    components(schemas(ErrorResponse, handlers::MessageResponse, handlers::HealthResponse))
)]
pub struct ApiDoc;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        // Data routes
        .route("/projects", get(list_projects))
        .route("/create-project", post(create_project))
        .route("/contribute", post(create_contribution))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(middleware::from_fn(track_http))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    with_cors(router)
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
