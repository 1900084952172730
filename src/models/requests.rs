//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for PUT /cache/:key
///
/// `value` is declared optional so a well-formed body without it can be
/// rejected with a precise error instead of a generic deserialization
/// failure. `ttl` is milliseconds; absent means 0 (no expiry).
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The value to store
    pub value: Option<String>,
    /// TTL in milliseconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl PutRequest {
    /// TTL to apply, defaulting to "no expiry".
    pub fn ttl_ms(&self) -> u64 {
        self.ttl.unwrap_or(0)
    }
}
