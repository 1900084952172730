//! Request and Response models for the cache server API
//!
//! DTOs used for serializing and deserializing HTTP bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::PutRequest;
pub use responses::{ErrorResponse, StatusResponse, ValueResponse};
