//! Background Tasks Module
//!
//! Long-lived tasks that run alongside request handling.
//!
//! # Tasks
//! - TTL sweeper: removes expired cache entries at a fixed interval

mod sweeper;

pub use sweeper::{spawn_sweeper, SweeperHandle};
