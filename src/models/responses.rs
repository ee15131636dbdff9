//! Response DTOs for the admin API

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::CacheStats;

/// Statistics of one cache (GET /caches/:name/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: String,
    #[serde(flatten)]
    pub stats: CacheStats,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(cache: impl Into<String>, stats: CacheStats) -> Self {
        Self {
            cache: cache.into(),
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Statistics of every cache (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct AllStatsResponse {
    pub caches: Vec<StatsResponse>,
    /// Snapshot time in ISO 8601 format
    pub generated_at: String,
}

impl AllStatsResponse {
    pub fn new(stats: BTreeMap<String, CacheStats>) -> Self {
        Self {
            caches: stats
                .into_iter()
                .map(|(name, stats)| StatsResponse::new(name, stats))
                .collect(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Result of any invalidation endpoint
#[derive(Debug, Clone, Serialize)]
pub struct InvalidationResponse {
    pub message: String,
    pub cache: String,
    pub removed: usize,
}

impl InvalidationResponse {
    pub fn new(cache: impl Into<String>, target: &str, removed: usize) -> Self {
        let cache = cache.into();
        Self {
            message: format!("Removed {removed} entries for {target} from '{cache}'"),
            cache,
            removed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
