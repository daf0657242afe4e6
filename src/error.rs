//! Unified error types for the backend.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::records::Table;

/// Message returned when a creation payload lacks a required key.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields";

/// Process-level error: startup, configuration and serving.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Database client error.
    #[error("database error: {0}")]
    Store(#[from] StoreError),

    /// Prometheus exporter could not be installed.
    #[error("metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors talking to the remote table store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("request to database failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("database rejected request (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error message from the gateway.
        message: String,
    },

    /// The gateway answered with a body we could not decode.
    #[error("unexpected database response: {0}")]
    Decode(String),

    /// An insert succeeded but returned no representation.
    #[error("insert into {table} returned no rows")]
    EmptyInsert {
        /// Target table.
        table: Table,
    },

    /// The configured base URL could not be used.
    #[error("invalid database url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The store is unreachable.
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A required key is absent from the request body.
    #[error("Missing required fields")]
    MissingFields {
        /// Table the payload was meant for.
        table: Table,
        /// Keys that were absent (logged, never returned).
        missing: Vec<&'static str>,
    },

    /// The body could not be read as a JSON object.
    #[error("{0}")]
    InvalidBody(String),

    /// Anything that went wrong talking to the database.
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFields { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable error message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BackendError>;
