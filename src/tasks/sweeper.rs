//! TTL Sweeper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

// == Sweeper Handle ==
/// Owns the sweeper task and its stop signal.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper and waits for it to finish its current pass.
    ///
    /// Worst-case latency is one sweep interval: the stop signal is
    /// observed between sleeps.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Spawns the background sweeper.
///
/// Every `interval_ms` the task takes one write lock, removes every
/// expired entry in a single pass, and logs the removal count.
///
/// # Arguments
/// * `cache` - Shared cache store
/// * `interval_ms` - Sweep interval in milliseconds
pub fn spawn_sweeper(cache: Arc<RwLock<CacheStore>>, interval_ms: u64) -> SweeperHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);
    let interval = Duration::from_millis(interval_ms);

    let task = tokio::spawn(async move {
        info!(interval_ms, "sweeper started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown_rx.changed() => break,
            }

            let removed = {
                let mut store = cache.write().await;
                store.sweep_expired()
            };

            if removed > 0 {
                info!(removed, "sweeper removed expired entries");
            } else {
                debug!("sweeper pass found no expired entries");
            }
        }

        info!("sweeper stopped");
    });

    SweeperHandle { shutdown, task }
}
