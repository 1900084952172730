//! Configuration Module
//!
//! Command-line configuration for a cache node.

use clap::{Parser, ValueEnum};

/// Node role at startup.
///
/// A primary fans mutations out to its followers; a follower accepts
/// replicated mutations locally and never fans out. Roles can flip at
/// runtime through election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Primary,
    Follower,
}

/// Server configuration, parsed from the command line.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fleetcache",
    version,
    about = "Replicated in-memory LRU/TTL cache with health-probe primary election"
)]
pub struct Config {
    /// Node role at startup
    #[arg(long, value_enum, default_value_t = Role::Primary)]
    pub role: Role,

    /// HTTP listen port
    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Follower base URL, repeatable (e.g. http://127.0.0.1:5001)
    #[arg(long = "followers", value_name = "URL")]
    pub followers: Vec<String>,

    /// Election peer, repeatable; URL or URL=PRIORITY (default priority 0)
    #[arg(long = "peers", value_name = "URL[=PRIORITY]", value_parser = parse_peer)]
    pub peers: Vec<(String, i32)>,

    /// Node label used in logs
    #[arg(long)]
    pub id: Option<String>,

    /// Accepted for launcher compatibility; health probes target the API
    /// listener, so this port is unused
    #[arg(long)]
    pub election_port: Option<u16>,

    /// Maximum number of live cache entries
    #[arg(long, default_value_t = 1024)]
    pub capacity: usize,

    /// Background sweep interval in milliseconds
    #[arg(long, default_value_t = 100)]
    pub eviction_interval_ms: u64,

    /// Health probe interval in milliseconds
    #[arg(long, default_value_t = 500)]
    pub election_interval_ms: u64,

    /// Consecutive probe failures before an election
    #[arg(long, default_value_t = 3)]
    pub failure_threshold: u32,

    /// Primary to observe at startup; defaults to self for the primary
    /// role and to unset for followers
    #[arg(long)]
    pub initial_primary: Option<String>,
}

impl Config {
    /// Base URL peers use to reach this node.
    pub fn self_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Label for log lines: the explicit id, or the node URL.
    pub fn node_label(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.self_url())
    }

    /// Primary the elector observes at startup.
    pub fn startup_primary(&self) -> Option<String> {
        self.initial_primary.clone().or(match self.role {
            Role::Primary => Some(self.self_url()),
            Role::Follower => None,
        })
    }
}

/// Parses `URL` or `URL=PRIORITY` into a peer pair.
fn parse_peer(raw: &str) -> Result<(String, i32), String> {
    match raw.rsplit_once('=') {
        Some((url, priority)) => {
            let priority = priority
                .parse()
                .map_err(|_| format!("invalid peer priority in '{raw}'"))?;
            Ok((url.to_string(), priority))
        }
        None => Ok((raw.to_string(), 0)),
    }
}
