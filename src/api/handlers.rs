//! Admin API Handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{CacheError, Result};
use crate::models::{
    AllStatsResponse, HealthResponse, InvalidateRequest, InvalidationResponse, StatsResponse,
};
use crate::registry::CacheRegistry;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: CacheRegistry,
}

impl AppState {
    pub fn new(registry: CacheRegistry) -> Self {
        Self { registry }
    }

    /// Creates a new AppState with a fresh registry built from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(CacheRegistry::new(config.clone()))
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
pub async fn all_stats_handler(State(state): State<AppState>) -> Json<AllStatsResponse> {
    Json(AllStatsResponse::new(state.registry.stats()))
}

/// Handler for GET /caches/:name/stats
pub async fn cache_stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatsResponse>> {
    let stats = state.registry.stats_for(&name)?;
    Ok(Json(StatsResponse::new(name, stats)))
}

/// Handler for DELETE /caches/:name
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<InvalidationResponse>> {
    let removed = state.registry.clear(&name)?;
    Ok(Json(InvalidationResponse::new(name, "all keys", removed)))
}

/// Handler for DELETE /caches/:name/namespaces/:namespace
pub async fn delete_namespace_handler(
    State(state): State<AppState>,
    Path((name, namespace)): Path<(String, String)>,
) -> Result<Json<InvalidationResponse>> {
    let removed = state.registry.delete_namespace(&name, &namespace)?;
    let target = format!("namespace '{namespace}'");
    Ok(Json(InvalidationResponse::new(name, &target, removed)))
}

/// Handler for DELETE /caches/:name/entries/:namespace/:key
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Path((name, namespace, key)): Path<(String, String, String)>,
) -> Result<Json<InvalidationResponse>> {
    if !state.registry.delete(&name, &namespace, &key)? {
        return Err(CacheError::NotFound(format!("{namespace}:{key}")));
    }
    let target = format!("key '{namespace}:{key}'");
    Ok(Json(InvalidationResponse::new(name, &target, 1)))
}

/// Handler for POST /caches/:name/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidationResponse>> {
    let pattern = req.to_pattern()?;
    let removed = state
        .registry
        .invalidate_matching(&name, &pattern, req.namespace.as_deref())?;
    let target = format!("pattern '{}'", req.pattern);
    Ok(Json(InvalidationResponse::new(name, &target, removed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PatternKind;
    use crate::config::Config;
    use std::time::Duration;

    const MINUTE: Duration = Duration::from_secs(60);

    fn state_with_leaderboards() -> AppState {
        let state = AppState::from_config(&Config::default());
        let cache = state.registry.cache::<u32>("leaderboards").unwrap();
        cache.set("leaderboard", "class:1:daily", 1, MINUTE);
        cache.set("leaderboard", "class:2:daily", 2, MINUTE);
        cache.set("points", "student-1", 50, MINUTE);
        state
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_cache_stats_handler() {
        let state = state_with_leaderboards();

        let response = cache_stats_handler(State(state), Path("leaderboards".to_string()))
            .await
            .unwrap();
        assert_eq!(response.stats.total_entries, 3);
    }

    #[tokio::test]
    async fn test_unknown_cache() {
        let state = state_with_leaderboards();

        let result = clear_handler(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(CacheError::UnknownCache(_))));
    }

    #[tokio::test]
    async fn test_delete_namespace_handler() {
        let state = state_with_leaderboards();

        let response = delete_namespace_handler(
            State(state.clone()),
            Path(("leaderboards".to_string(), "leaderboard".to_string())),
        )
        .await
        .unwrap();

        assert_eq!(response.removed, 2);
        assert_eq!(state.registry.stats_for("leaderboards").unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_delete_entry_handler_not_found() {
        let state = state_with_leaderboards();

        let result = delete_entry_handler(
            State(state),
            Path((
                "leaderboards".to_string(),
                "points".to_string(),
                "student-2".to_string(),
            )),
        )
        .await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalidate_handler() {
        let state = state_with_leaderboards();
        let req = InvalidateRequest {
            pattern: r"^class:1:".to_string(),
            kind: PatternKind::Regex,
            namespace: Some("leaderboard".to_string()),
        };

        let response = invalidate_handler(
            State(state),
            Path("leaderboards".to_string()),
            Json(req),
        )
        .await
        .unwrap();
        assert_eq!(response.removed, 1);
    }
}
