//! Request and Response models for the admin API
//!
//! DTOs serialized to and from the HTTP bodies of the admin endpoints.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::InvalidateRequest;
pub use responses::{
    AllStatsResponse, ErrorResponse, HealthResponse, InvalidationResponse, StatsResponse,
};
