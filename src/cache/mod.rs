//! Cache Module
//!
//! Namespaced in-process caching with TTL expiry, size-bound eviction and
//! deduplicated memoization.

mod entry;
mod eviction;
mod namespaced;
mod pattern;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, CacheKey};
pub use eviction::{EvictionPolicy, EXPIRY_BATCH_DIVISOR};
pub use namespaced::{NamespacedCache, WeakNamespacedCache};
pub use pattern::{KeyPattern, PatternKind};
pub use stats::CacheStats;
pub use store::CacheStore;
