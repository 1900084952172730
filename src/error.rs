//! Error types for the cache server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == API Error Enum ==
/// Unified error type for the HTTP surface.
///
/// The cache engine itself never fails; it signals absence with `Option`.
/// These variants cover the client-facing taxonomy only.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Path does not match a live key
    #[error("not found")]
    NotFound,

    /// Malformed JSON or missing required field
    #[error("{0}")]
    BadRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, ApiError>;
