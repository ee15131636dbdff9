//! Admin API Module
//!
//! HTTP handlers and routing for inspecting and invalidating caches.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Statistics of every cache
//! - `GET /caches/:name/stats` - Statistics of one cache
//! - `DELETE /caches/:name` - Clear one cache
//! - `DELETE /caches/:name/namespaces/:namespace` - Invalidate a namespace
//! - `DELETE /caches/:name/entries/:namespace/:key` - Delete one entry
//! - `POST /caches/:name/invalidate` - Invalidate by prefix or regex

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
