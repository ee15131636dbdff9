//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries, bounding
//! memory held by keys that are set once and never read again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::WeakNamespacedCache;

/// Spawns a task that purges expired entries every `interval`.
///
/// The task only holds a weak handle: it exits on its own once the cache is
/// dropped, and `NamespacedCache::destroy` aborts it explicitly.
///
/// # Example
/// ```ignore
/// let cache = NamespacedCache::<u32>::new("points", CacheSettings::default());
/// let sweep_handle = spawn_sweep_task(cache.downgrade(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<V: Send + Sync + 'static>(
    cache: WeakNamespacedCache<V>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(?interval, "starting expiry sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let Some(cache) = cache.upgrade() else {
                debug!("cache dropped, stopping expiry sweep");
                break;
            };

            let removed = cache.purge_expired();
            if removed > 0 {
                info!(cache = cache.name(), removed, "expiry sweep removed entries");
            } else {
                debug!(cache = cache.name(), "expiry sweep found nothing to remove");
            }
        }
    })
}
