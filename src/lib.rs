//! Fleetcache - a replicated in-memory cache
//!
//! Single-writer, multi-reader LRU/TTL cache with best-effort replication
//! to followers and health-probe based primary election.

pub mod api;
pub mod cache;
pub mod config;
pub mod election;
pub mod error;
pub mod models;
pub mod replication;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheStore;
pub use config::Config;
pub use tasks::spawn_sweeper;
