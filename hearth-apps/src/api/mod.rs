//! HTTP API handlers for hearth-apps

pub mod admin;
pub mod apps;
pub mod health;

pub use health::health_routes;

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Error body returned by all endpoints
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Error response pair used by handlers
pub type ApiError = (StatusCode, Json<StatusResponse>);

pub(crate) fn api_error(code: StatusCode, status: impl Into<String>) -> ApiError {
    (
        code,
        Json(StatusResponse {
            status: status.into(),
        }),
    )
}
