//! Campus Cache - namespaced in-process caching for the campus backend
//!
//! Typed TTL caches with request deduplication, LRU or expiry-ordered
//! eviction, periodic sweeping, and a registry that owns one cache per
//! logical purpose. The host application owns the registry and may mount the
//! admin API on it through [`server::serve`].

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod server;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStats, EvictionPolicy, KeyPattern, NamespacedCache};
pub use config::{CacheSettings, Config, TtlTable};
pub use error::CacheError;
pub use registry::{CacheRegistry, ManagedCache};
