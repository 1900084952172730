//! Primary Election Coordinator
//!
//! Probes the current primary's health endpoint on a fixed interval,
//! counts consecutive failures, and runs a priority-ordered election over
//! peers plus self once the threshold is reached. Election is purely
//! health-probe based: a partitioned cluster can elect two primaries, and
//! no quorum or fencing exists to reconcile them.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Invoked from the election loop exactly when self becomes primary.
/// Must not re-enter the elector and should not do unbounded work inline.
pub type PromoteCallback = Arc<dyn Fn() + Send + Sync>;

/// Health probes must answer within this bound to count as healthy.
const PROBE_TIMEOUT: Duration = Duration::from_millis(300);

/// A node's own candidate priority when it stands for election.
const SELF_PRIORITY: i32 = 0;

// == Phase ==
/// Observable coordinator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectorPhase {
    /// Not started
    Idle,
    /// Probing the current primary
    Observing,
    /// Current primary considered dead; scanning candidates
    Electing,
    /// Stopped; current primary cleared
    Stopped,
}

// == Config ==
/// Construction parameters for the coordinator.
#[derive(Debug, Clone)]
pub struct ElectorConfig {
    /// This node's own base URL
    pub self_url: String,
    /// Peer base URLs with election priorities (higher wins)
    pub peers: Vec<(String, i32)>,
    /// Primary to observe initially, if already known
    pub initial_primary: Option<String>,
    /// Probe interval
    pub interval: Duration,
    /// Consecutive probe failures before an election
    pub failure_threshold: u32,
}

// == Shared State ==
#[derive(Debug)]
struct ElectorState {
    leader: Option<String>,
    failures: u32,
    phase: ElectorPhase,
}

struct ElectorInner {
    self_url: String,
    peers: Vec<(String, i32)>,
    interval: Duration,
    failure_threshold: u32,
    promote_cb: PromoteCallback,
    client: Client,
    state: Mutex<ElectorState>,
    shutdown: watch::Sender<bool>,
}

// == Leader Elector ==
/// Per-node election coordinator. One probing task per elector; the
/// current-primary field is the only state other subsystems read, guarded
/// by its own mutex that is never held across a probe or the callback.
pub struct LeaderElector {
    inner: Arc<ElectorInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LeaderElector {
    // == Constructor ==
    pub fn new(config: ElectorConfig, promote_cb: PromoteCallback) -> Self {
        let client = Client::builder()
            .connect_timeout(PROBE_TIMEOUT)
            .timeout(PROBE_TIMEOUT)
            .build()
            .expect("failed to build health probe client");

        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(ElectorInner {
                self_url: config.self_url,
                peers: config.peers,
                interval: config.interval,
                failure_threshold: config.failure_threshold,
                promote_cb,
                client,
                state: Mutex::new(ElectorState {
                    leader: config.initial_primary,
                    failures: 0,
                    phase: ElectorPhase::Idle,
                }),
                shutdown,
            }),
            task: Mutex::new(None),
        }
    }

    // == Lifecycle ==
    /// Starts observing. With no peers the node promotes itself at once
    /// and no probing task runs. Calling start twice is a no-op.
    pub fn start(&self) {
        {
            let mut state = self.inner.lock_state();
            if state.phase != ElectorPhase::Idle {
                return;
            }
            state.phase = ElectorPhase::Observing;
        }

        if self.inner.peers.is_empty() {
            self.inner.lock_state().leader = Some(self.inner.self_url.clone());
            info!(node = %self.inner.self_url, "no peers configured; promoting self");
            (self.inner.promote_cb)();
            return;
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.run_loop().await });
        *self.task.lock().expect("elector task lock poisoned") = Some(handle);
    }

    /// Signals the loop, waits for it to exit, and clears the current
    /// primary. Idempotent.
    pub async fn stop(&self) {
        let _ = self.inner.shutdown.send(true);

        let handle = self
            .task
            .lock()
            .expect("elector task lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        let mut state = self.inner.lock_state();
        state.leader = None;
        state.failures = 0;
        state.phase = ElectorPhase::Stopped;
    }

    // == Observability ==
    /// Sets the current primary and resets the failure counter. Safe from
    /// any task.
    pub fn set_leader(&self, leader_url: impl Into<String>) {
        let mut state = self.inner.lock_state();
        state.leader = Some(leader_url.into());
        state.failures = 0;
    }

    /// Returns the current primary, if one is known. Safe from any task.
    pub fn get_current_leader(&self) -> Option<String> {
        self.inner.lock_state().leader.clone()
    }

    /// Whether this node currently believes it is primary.
    pub fn is_leader(&self) -> bool {
        self.inner.lock_state().leader.as_deref() == Some(self.inner.self_url.as_str())
    }

    /// Current coordinator phase.
    pub fn phase(&self) -> ElectorPhase {
        self.inner.lock_state().phase
    }
}

impl ElectorInner {
    // == Election Loop ==
    async fn run_loop(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();
        info!(node = %self.self_url, "election loop started");

        loop {
            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = shutdown.changed() => break,
            }

            let phase = self.lock_state().phase;
            match phase {
                ElectorPhase::Observing => self.observe_tick().await,
                ElectorPhase::Electing => self.elect_tick().await,
                ElectorPhase::Idle | ElectorPhase::Stopped => break,
            }
        }

        info!(node = %self.self_url, "election loop exited");
    }

    /// One Observing tick: fill an empty primary slot, then probe it.
    async fn observe_tick(&self) {
        let promote_self = {
            let mut state = self.lock_state();
            if state.leader.is_none() {
                match self.highest_priority_peer() {
                    Some((url, _)) => {
                        state.leader = Some(url.clone());
                        false
                    }
                    None => {
                        state.leader = Some(self.self_url.clone());
                        true
                    }
                }
            } else {
                false
            }
        };
        if promote_self {
            info!(node = %self.self_url, "no peers to observe; promoting self");
            (self.promote_cb)();
            return;
        }

        let target = match self.lock_state().leader.clone() {
            Some(url) => url,
            None => return,
        };

        if self.probe(&target).await {
            self.lock_state().failures = 0;
            return;
        }

        let start_election = {
            let mut state = self.lock_state();
            state.failures += 1;
            debug!(
                primary = %target,
                failures = state.failures,
                threshold = self.failure_threshold,
                "health probe failed"
            );
            if state.failures >= self.failure_threshold {
                state.phase = ElectorPhase::Electing;
                true
            } else {
                false
            }
        };

        if start_election {
            warn!(primary = %target, "primary unresponsive; starting election");
            self.elect_tick().await;
        }
    }

    /// One Electing tick: probe candidates by descending priority and
    /// adopt the first responder.
    async fn elect_tick(&self) {
        let mut candidates = self.peers.clone();
        candidates.push((self.self_url.clone(), SELF_PRIORITY));
        // Stable sort keeps iteration order among equal priorities.
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        for (url, priority) in candidates {
            if !self.probe(&url).await {
                continue;
            }

            let won = url == self.self_url;
            {
                let mut state = self.lock_state();
                state.leader = Some(url.clone());
                state.failures = 0;
                state.phase = ElectorPhase::Observing;
            }
            info!(primary = %url, priority, "elected new primary");
            if won {
                (self.promote_cb)();
            }
            return;
        }

        warn!(node = %self.self_url, "no candidate responded; retrying next tick");
    }

    // == Helpers ==
    async fn probe(&self, base_url: &str) -> bool {
        let url = format!("{}/healthz", base_url);
        match self.client.get(&url).send().await {
            Ok(res) => res.status() == reqwest::StatusCode::OK,
            Err(_) => false,
        }
    }

    /// First among equals wins: strictly-greater comparison keeps the
    /// earliest peer on priority ties.
    fn highest_priority_peer(&self) -> Option<&(String, i32)> {
        self.peers
            .iter()
            .fold(None, |best: Option<&(String, i32)>, peer| match best {
                Some(b) if peer.1 > b.1 => Some(peer),
                Some(b) => Some(b),
                None => Some(peer),
            })
    }

    fn lock_state(&self) -> MutexGuard<'_, ElectorState> {
        self.state.lock().expect("elector state lock poisoned")
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config(self_url: &str, peers: Vec<(String, i32)>) -> ElectorConfig {
        ElectorConfig {
            self_url: self_url.to_string(),
            peers,
            initial_primary: None,
            interval: Duration::from_millis(50),
            failure_threshold: 2,
        }
    }

    fn counting_callback() -> (PromoteCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let cb_count = Arc::clone(&count);
        let cb: PromoteCallback = Arc::new(move || {
            cb_count.fetch_add(1, Ordering::SeqCst);
        });
        (cb, count)
    }

    #[tokio::test]
    async fn test_no_peers_promotes_self_immediately() {
        let (cb, promotions) = counting_callback();
        let elector = LeaderElector::new(test_config("http://127.0.0.1:7001", vec![]), cb);

        elector.start();

        assert!(elector.is_leader());
        assert_eq!(
            elector.get_current_leader(),
            Some("http://127.0.0.1:7001".to_string())
        );
        assert_eq!(promotions.load(Ordering::SeqCst), 1);
        assert_eq!(elector.phase(), ElectorPhase::Observing);

        elector.stop().await;
    }

    #[tokio::test]
    async fn test_start_twice_promotes_once() {
        let (cb, promotions) = counting_callback();
        let elector = LeaderElector::new(test_config("http://127.0.0.1:7001", vec![]), cb);

        elector.start();
        elector.start();

        assert_eq!(promotions.load(Ordering::SeqCst), 1);
        elector.stop().await;
    }

    #[tokio::test]
    async fn test_set_and_get_leader() {
        let (cb, _) = counting_callback();
        let elector = LeaderElector::new(
            test_config(
                "http://127.0.0.1:7001",
                vec![("http://127.0.0.1:7002".to_string(), 1)],
            ),
            cb,
        );

        assert_eq!(elector.get_current_leader(), None);
        elector.set_leader("http://127.0.0.1:7002");
        assert_eq!(
            elector.get_current_leader(),
            Some("http://127.0.0.1:7002".to_string())
        );
        assert!(!elector.is_leader());
    }

    #[tokio::test]
    async fn test_stop_clears_leader_and_is_idempotent() {
        let (cb, _) = counting_callback();
        let elector = LeaderElector::new(test_config("http://127.0.0.1:7001", vec![]), cb);

        elector.start();
        assert!(elector.is_leader());

        elector.stop().await;
        assert_eq!(elector.get_current_leader(), None);
        assert_eq!(elector.phase(), ElectorPhase::Stopped);

        elector.stop().await;
        assert_eq!(elector.phase(), ElectorPhase::Stopped);
    }

    #[tokio::test]
    async fn test_observing_picks_highest_priority_peer_as_initial_primary() {
        let (cb, promotions) = counting_callback();
        // Peers are unreachable; the elector should still select the
        // highest-priority one as the primary to observe.
        let elector = LeaderElector::new(
            ElectorConfig {
                self_url: "http://127.0.0.1:7001".to_string(),
                peers: vec![
                    ("http://127.0.0.1:7002".to_string(), 1),
                    ("http://127.0.0.1:7003".to_string(), 5),
                ],
                initial_primary: None,
                interval: Duration::from_millis(30),
                failure_threshold: 1000,
            },
            cb,
        );

        elector.start();
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(
            elector.get_current_leader(),
            Some("http://127.0.0.1:7003".to_string())
        );
        assert_eq!(promotions.load(Ordering::SeqCst), 0);

        elector.stop().await;
    }

    #[tokio::test]
    async fn test_dead_peers_elect_self() {
        let (cb, promotions) = counting_callback();

        // Self needs a live /healthz to win its own election probe.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let self_url = format!("http://{}", listener.local_addr().unwrap());
        let app = axum::Router::new().route(
            "/healthz",
            axum::routing::get(|| async { axum::Json(serde_json::json!({"status": "ok"})) }),
        );
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let elector = LeaderElector::new(
            ElectorConfig {
                self_url: self_url.clone(),
                peers: vec![("http://127.0.0.1:1".to_string(), 5)],
                initial_primary: Some("http://127.0.0.1:1".to_string()),
                interval: Duration::from_millis(50),
                failure_threshold: 2,
            },
            cb,
        );

        elector.start();
        // threshold * interval + election scan + probe-timeout slack
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(elector.is_leader(), "self should win against dead peers");
        assert_eq!(promotions.load(Ordering::SeqCst), 1);

        elector.stop().await;
        server.abort();
    }
}
