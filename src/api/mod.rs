//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `GET /cache/:key` - Retrieve a value by key
//! - `PUT /cache/:key` - Store a key-value pair with optional TTL
//! - `DELETE /cache/:key` - Delete a key
//! - `GET /healthz` - Health probe target
//! - `GET /metrics` - Prometheus text exposition

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
