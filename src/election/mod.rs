//! Election Module
//!
//! Health-probe based primary election. Each node runs one coordinator
//! that tracks the cluster's current primary and promotes self when the
//! observed primary stops answering.

mod elector;

pub use elector::{ElectorConfig, ElectorPhase, LeaderElector, PromoteCallback};
