//! Admin API Routes

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    all_stats_handler, cache_stats_handler, clear_handler, delete_entry_handler,
    delete_namespace_handler, health_handler, invalidate_handler, AppState,
};

/// Creates the admin router.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(all_stats_handler))
        .route("/caches/:name", delete(clear_handler))
        .route("/caches/:name/stats", get(cache_stats_handler))
        .route("/caches/:name/invalidate", post(invalidate_handler))
        .route(
            "/caches/:name/namespaces/:namespace",
            delete(delete_namespace_handler),
        )
        .route(
            "/caches/:name/entries/:namespace/:key",
            delete(delete_entry_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
