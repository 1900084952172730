//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

/// Response body for a cache hit (GET /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct ValueResponse {
    /// The stored value
    pub value: String,
}

impl ValueResponse {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Generic status body for successful mutations and health checks.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    /// `{"status":"ok"}` — successful PUT, and /healthz.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// `{"status":"deleted"}` — successful DELETE.
    pub fn deleted() -> Self {
        Self {
            status: "deleted".to_string(),
        }
    }
}

/// Error body shared by all failure responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
