//! Cache Metrics Module
//!
//! Atomic hit/miss counters and the Prometheus text exposition.
//!
//! The counters live outside the cache lock so that metric readers never
//! contend with cache mutators.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

// == Cache Metrics ==
/// Lock-free hit/miss counters shared between the cache store and the
/// metrics endpoint.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheMetrics {
    /// Creates metrics with both counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of cache hits.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the number of cache misses.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

// == Metrics Snapshot ==
/// Point-in-time view of every exported metric.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
    pub eviction_interval_ms: u64,
}

impl MetricsSnapshot {
    /// Renders the snapshot in Prometheus text exposition format.
    ///
    /// Each metric carries `# HELP` and `# TYPE` lines; metrics are
    /// separated by blank lines.
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "# HELP cache_hits_total Total cache hits");
        let _ = writeln!(output, "# TYPE cache_hits_total counter");
        let _ = writeln!(output, "cache_hits_total {}\n", self.hits);

        let _ = writeln!(output, "# HELP cache_misses_total Total cache misses");
        let _ = writeln!(output, "# TYPE cache_misses_total counter");
        let _ = writeln!(output, "cache_misses_total {}\n", self.misses);

        let _ = writeln!(output, "# HELP cache_size Current number of live entries");
        let _ = writeln!(output, "# TYPE cache_size gauge");
        let _ = writeln!(output, "cache_size {}\n", self.size);

        let _ = writeln!(output, "# HELP cache_capacity Maximum number of entries");
        let _ = writeln!(output, "# TYPE cache_capacity gauge");
        let _ = writeln!(output, "cache_capacity {}\n", self.capacity);

        let _ = writeln!(
            output,
            "# HELP cache_eviction_interval_ms Background sweep interval in milliseconds"
        );
        let _ = writeln!(output, "# TYPE cache_eviction_interval_ms gauge");
        let _ = writeln!(
            output,
            "cache_eviction_interval_ms {}",
            self.eviction_interval_ms
        );

        output
    }
}
