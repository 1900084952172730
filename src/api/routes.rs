//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{delete_value, get_value, healthz, metrics, put_value, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /cache/:key` - Retrieve a value
/// - `PUT /cache/:key` - Store a value with optional TTL
/// - `DELETE /cache/:key` - Remove a key
/// - `GET /healthz` - Health probe target
/// - `GET /metrics` - Prometheus text exposition
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache/:key",
            get(get_value).put(put_value).delete(delete_value),
        )
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
