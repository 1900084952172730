//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tokio::sync::RwLock;

use crate::cache::{CacheMetrics, CacheStore, MetricsSnapshot};
use crate::error::{ApiError, Result};
use crate::models::{PutRequest, StatusResponse, ValueResponse};
use crate::replication::{Mutation, ReplicationHandle};

/// Application state shared across all handlers.
///
/// The cache store sits behind an `Arc<RwLock<_>>`; handlers take the
/// write lock for every operation that touches recency order (including
/// GET) and the read lock for inspection-only work. The hit/miss counters
/// are held separately so metric reads never contend with cache mutators.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: Arc<RwLock<CacheStore>>,
    /// Atomic counters, readable without the cache lock
    pub metrics: Arc<CacheMetrics>,
    /// Fan-out handle; mutations are enqueued only while this node is
    /// primary
    pub replication: ReplicationHandle,
}

impl AppState {
    /// Wraps a store for shared handler access.
    pub fn new(store: CacheStore, replication: ReplicationHandle) -> Self {
        let metrics = store.metrics_handle();
        Self {
            cache: Arc::new(RwLock::new(store)),
            metrics,
            replication,
        }
    }
}

/// Keys must match `\w+`. Anything else is treated as an unmatched path.
fn validate_key(key: &str) -> Result<()> {
    let well_formed = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}

/// Handler for GET /cache/:key
///
/// Promotes the key on a hit; an expired entry reads as absent.
pub async fn get_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>> {
    validate_key(&key)?;

    // Write lock: a hit reorders recency, a read of an expired entry
    // removes it.
    let mut cache = state.cache.write().await;
    match cache.get(&key) {
        Some(value) => Ok(Json(ValueResponse::new(value))),
        None => Err(ApiError::NotFound),
    }
}

/// Handler for PUT /cache/:key
///
/// Body: `{"value":"<v>","ttl":<ms>}`, ttl optional (0 = no expiry).
/// The body is parsed by hand so malformed JSON surfaces the parser's
/// message and a well-formed body without `value` gets a precise error.
/// After the local commit the mutation fans out when this node is
/// primary.
pub async fn put_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: String,
) -> Result<Json<StatusResponse>> {
    validate_key(&key)?;

    let request: PutRequest =
        serde_json::from_str(&body).map_err(|err| ApiError::BadRequest(err.to_string()))?;
    let ttl_ms = request.ttl_ms();
    let value = request
        .value
        .ok_or_else(|| ApiError::BadRequest("missing 'value'".to_string()))?;

    {
        let mut cache = state.cache.write().await;
        cache.put(&key, value.clone(), ttl_ms);
    }

    state.replication.submit(Mutation::Put {
        key,
        value,
        ttl_ms,
    });

    Ok(Json(StatusResponse::ok()))
}

/// Handler for DELETE /cache/:key
pub async fn delete_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<StatusResponse>> {
    validate_key(&key)?;

    let erased = {
        let mut cache = state.cache.write().await;
        cache.erase(&key)
    };

    if !erased {
        return Err(ApiError::NotFound);
    }

    state.replication.submit(Mutation::Delete { key });

    Ok(Json(StatusResponse::deleted()))
}

/// Handler for GET /healthz
///
/// Probed by peers' election coordinators; any 200 counts as healthy.
pub async fn healthz() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// Handler for GET /metrics
///
/// Prometheus text exposition of the cache counters and gauges.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let (size, capacity, eviction_interval_ms) = {
        let cache = state.cache.read().await;
        (cache.size(), cache.capacity(), cache.eviction_interval())
    };
    let snapshot = MetricsSnapshot {
        hits: state.metrics.hits(),
        misses: state.metrics.misses(),
        size,
        capacity,
        eviction_interval_ms,
    };

    (
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        snapshot.to_prometheus(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replication::spawn_replication_worker;
    use crate::replication::ReplicationFanout;

    fn test_state() -> AppState {
        let (replication, worker) = spawn_replication_worker(Arc::new(ReplicationFanout::new()));
        worker.abort();
        AppState::new(CacheStore::new(100, 100), replication)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let state = test_state();

        let result = put_value(
            State(state.clone()),
            Path("test_key".to_string()),
            r#"{"value":"test_value"}"#.to_string(),
        )
        .await;
        assert!(result.is_ok());

        let response = get_value(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "test_value");
    }

    #[tokio::test]
    async fn test_get_absent_key_is_not_found() {
        let state = test_state();

        let result = get_value(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_put_missing_value_is_bad_request() {
        let state = test_state();

        let result = put_value(
            State(state),
            Path("k".to_string()),
            r#"{"ttl":500}"#.to_string(),
        )
        .await;

        match result {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "missing 'value'"),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_put_malformed_json_is_bad_request() {
        let state = test_state();

        let result = put_value(
            State(state),
            Path("k".to_string()),
            r#"{"value": "#.to_string(),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_invalid_key_is_not_found() {
        let state = test_state();

        let result = get_value(State(state), Path("bad-key!".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_round_trip() {
        let state = test_state();

        put_value(
            State(state.clone()),
            Path("to_delete".to_string()),
            r#"{"value":"v"}"#.to_string(),
        )
        .await
        .unwrap();

        assert!(delete_value(State(state.clone()), Path("to_delete".to_string()))
            .await
            .is_ok());
        assert!(matches!(
            delete_value(State(state), Path("to_delete".to_string())).await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = healthz().await;
        assert_eq!(response.status, "ok");
    }
}
