//! Replication Module
//!
//! Fans mutations out to follower nodes. A single worker task drains a
//! queue of mutations, so for any fixed follower the send order matches
//! the order in which the primary committed them, and request handlers
//! never wait on follower I/O.

mod fanout;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use fanout::ReplicationFanout;

// == Mutation ==
/// A replicable cache mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put {
        key: String,
        value: String,
        ttl_ms: u64,
    },
    Delete {
        key: String,
    },
}

// == Replication Handle ==
/// Façade-side handle: enqueues mutations while replication is enabled.
///
/// The enabled bit is flipped by the supervisor — on at startup for a
/// primary or when the promotion callback fires, off on demotion. The
/// handle is cheap to clone; all clones share the bit and the queue.
#[derive(Debug, Clone)]
pub struct ReplicationHandle {
    tx: mpsc::UnboundedSender<Mutation>,
    enabled: Arc<AtomicBool>,
}

impl ReplicationHandle {
    pub fn new(tx: mpsc::UnboundedSender<Mutation>) -> Self {
        Self {
            tx,
            enabled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Turns fan-out on. Idempotent.
    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            info!("replication enabled");
        }
    }

    /// Turns fan-out off. Idempotent.
    pub fn disable(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            info!("replication disabled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Enqueues a mutation for fan-out when replication is enabled.
    ///
    /// Returns whether the mutation was queued. Mutations on a follower
    /// are dropped here, which is what keeps followers from replicating
    /// further.
    pub fn submit(&self, mutation: Mutation) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if self.tx.send(mutation).is_err() {
            warn!("replication worker gone; mutation dropped");
            return false;
        }
        true
    }
}

// == Worker ==
/// Spawns the replication worker and returns the handle plus the task.
///
/// The worker runs until every sender clone is dropped or the task is
/// aborted at shutdown.
pub fn spawn_replication_worker(
    fanout: Arc<ReplicationFanout>,
) -> (ReplicationHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Mutation>();
    let handle = ReplicationHandle::new(tx);

    let worker = tokio::spawn(async move {
        while let Some(mutation) = rx.recv().await {
            debug!(?mutation, "replicating mutation");
            fanout.replicate(&mutation).await;
        }
    });

    (handle, worker)
}
