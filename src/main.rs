//! Fleetcache node supervisor
//!
//! Wires the cache engine, sweeper, replication fan-out, and election
//! coordinator together, serves the HTTP API, and handles graceful
//! shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetcache::api::{create_router, AppState};
use fleetcache::cache::CacheStore;
use fleetcache::config::{Config, Role};
use fleetcache::election::{ElectorConfig, LeaderElector, PromoteCallback};
use fleetcache::replication::{spawn_replication_worker, ReplicationFanout, ReplicationHandle};
use fleetcache::tasks::spawn_sweeper;

#[tokio::main]
async fn main() {
    // Defaults to "info", overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    info!(
        role = ?config.role,
        port = config.port,
        node = %config.node_label(),
        capacity = config.capacity,
        "starting fleetcache node"
    );
    if let Some(port) = config.election_port {
        warn!(
            election_port = port,
            "election traffic shares the API listener; --election-port is ignored"
        );
    }

    // Replication fan-out; enabled from the start only on a primary
    let fanout = Arc::new(ReplicationFanout::new());
    for follower in &config.followers {
        fanout.add_follower(follower.clone());
    }
    let (replication, repl_worker) = spawn_replication_worker(fanout);
    if config.role == Role::Primary {
        replication.enable();
    }

    // Cache engine + background sweeper
    let store = CacheStore::new(config.capacity, config.eviction_interval_ms);
    let state = AppState::new(store, replication.clone());
    let sweeper = spawn_sweeper(Arc::clone(&state.cache), config.eviction_interval_ms);

    // Election coordinator; promotion flips the replication bit on
    let promote_handle = replication.clone();
    let promote_cb: PromoteCallback = Arc::new(move || {
        promote_handle.enable();
    });
    let elector = Arc::new(LeaderElector::new(
        ElectorConfig {
            self_url: config.self_url(),
            peers: config.peers.clone(),
            initial_primary: config.startup_primary(),
            interval: Duration::from_millis(config.election_interval_ms),
            failure_threshold: config.failure_threshold,
        },
        promote_cb,
    ));
    elector.start();

    let role_watcher = spawn_role_watcher(
        Arc::clone(&elector),
        replication.clone(),
        config.self_url(),
        Duration::from_millis(config.election_interval_ms),
    );

    // HTTP listener
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%addr, error = %err, "failed to bind listener");
            std::process::exit(1);
        }
    };
    info!("listening on http://{}", addr);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %err, "server error");
        std::process::exit(1);
    }

    // Orderly teardown: elector first (no more promotions), then sweeper,
    // then the remaining worker tasks.
    elector.stop().await;
    sweeper.stop().await;
    role_watcher.abort();
    repl_worker.abort();
    info!("shutdown complete");
}

/// Demotion path: replication is enabled by the promotion callback, and
/// this watcher turns it off once the elector stops naming this node as
/// primary.
fn spawn_role_watcher(
    elector: Arc<LeaderElector>,
    replication: ReplicationHandle,
    self_url: String,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let is_primary = elector.get_current_leader().as_deref() == Some(self_url.as_str());
            if !is_primary && replication.is_enabled() {
                warn!("no longer primary; disabling replication");
                replication.disable();
            }
        }
    })
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("received SIGTERM, shutting down");
        }
    }
}
