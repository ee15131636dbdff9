//! Error types for the cache subsystem
//!
//! Lookups never fail; the only errors are compute failures surfaced through
//! `get_or_set` and registry/admin misuse.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache subsystem.
///
/// `Clone` so that one compute outcome can be handed to every caller that
/// joined the same in-flight computation.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The caller-supplied compute function failed
    #[error("{0:#}")]
    Compute(Arc<anyhow::Error>),

    /// The compute task panicked or was torn down before producing a result
    #[error("Computation aborted: {0}")]
    ComputeAborted(String),

    /// No cache registered under this name
    #[error("Unknown cache: {0}")]
    UnknownCache(String),

    /// A cache exists under this name but holds a different value type
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Invalidation pattern could not be compiled
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Entry not present (admin deletes only)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The registry has been shut down
    #[error("Cache registry is shut down")]
    ShutDown,
}

impl CacheError {
    /// Wraps a compute failure so it can be shared between callers.
    pub fn compute(err: anyhow::Error) -> Self {
        CacheError::Compute(Arc::new(err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::UnknownCache(_) | CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidPattern(_) | CacheError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::TypeMismatch(_) => StatusCode::CONFLICT,
            CacheError::ShutDown => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Compute(_) | CacheError::ComputeAborted(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;
