//! Replication Fan-out
//!
//! Best-effort delivery of mutations to the configured follower set.
//! Failures are logged and swallowed; the originating client request has
//! already been answered from the local commit.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use super::Mutation;

/// Per-attempt read/write timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

// == Replication Fan-out ==
/// Forwards mutations to every follower, sequentially, with bounded
/// timeouts. Followers may be added at any time; removal is not supported.
#[derive(Debug)]
pub struct ReplicationFanout {
    followers: RwLock<Vec<String>>,
    client: Client,
}

impl Default for ReplicationFanout {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicationFanout {
    /// Creates a fan-out with an empty follower set.
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build replication HTTP client");

        Self {
            followers: RwLock::new(Vec::new()),
            client,
        }
    }

    /// Registers a follower base URL, e.g. `http://127.0.0.1:5001`.
    pub fn add_follower(&self, address: impl Into<String>) {
        let address = address.into();
        info!(follower = %address, "added follower");
        self.followers
            .write()
            .expect("follower set lock poisoned")
            .push(address);
    }

    /// Snapshot of the current follower set.
    pub fn followers(&self) -> Vec<String> {
        self.followers
            .read()
            .expect("follower set lock poisoned")
            .clone()
    }

    /// Delivers one mutation to every follower in order.
    ///
    /// Each attempt is bounded by the client timeouts; a failed follower
    /// is logged and skipped, never retried.
    pub async fn replicate(&self, mutation: &Mutation) {
        for follower in self.followers() {
            match mutation {
                Mutation::Put { key, value, ttl_ms } => {
                    self.forward_put(&follower, key, value, *ttl_ms).await;
                }
                Mutation::Delete { key } => {
                    self.forward_delete(&follower, key).await;
                }
            }
        }
    }

    async fn forward_put(&self, follower: &str, key: &str, value: &str, ttl_ms: u64) {
        let url = format!("{}/cache/{}", follower, key);
        let body = json!({ "value": value, "ttl": ttl_ms });

        match self.client.put(&url).json(&body).send().await {
            Ok(res) if res.status().is_success() => {
                info!(key, follower, "replicated PUT");
            }
            Ok(res) => {
                warn!(key, follower, status = %res.status(), "PUT replication rejected");
            }
            Err(err) => {
                warn!(key, follower, error = %err, "PUT replication failed");
            }
        }
    }

    async fn forward_delete(&self, follower: &str, key: &str) {
        let url = format!("{}/cache/{}", follower, key);

        match self.client.delete(&url).send().await {
            Ok(res) if res.status().is_success() => {
                info!(key, follower, "replicated DELETE");
            }
            Ok(res) => {
                warn!(key, follower, status = %res.status(), "DELETE replication rejected");
            }
            Err(err) => {
                warn!(key, follower, error = %err, "DELETE replication failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_follower() {
        let fanout = ReplicationFanout::new();
        fanout.add_follower("http://127.0.0.1:5001");

        assert_eq!(fanout.followers(), vec!["http://127.0.0.1:5001"]);
    }

    #[tokio::test]
    async fn test_replicate_put_to_unreachable_follower_does_not_error() {
        let fanout = ReplicationFanout::new();
        fanout.add_follower("http://127.0.0.1:1");

        fanout
            .replicate(&Mutation::Put {
                key: "foo".to_string(),
                value: "bar".to_string(),
                ttl_ms: 60_000,
            })
            .await;
    }

    #[tokio::test]
    async fn test_replicate_delete_to_unreachable_follower_does_not_error() {
        let fanout = ReplicationFanout::new();
        fanout.add_follower("http://127.0.0.1:1");

        fanout
            .replicate(&Mutation::Delete {
                key: "foo".to_string(),
            })
            .await;
    }
}
