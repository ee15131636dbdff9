//! Cache Registry
//!
//! Owns one typed cache per logical purpose. Built once at startup and passed
//! to whatever needs a cache; `shutdown` tears every cache down.

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::cache::{CacheStats, KeyPattern, NamespacedCache};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Managed Cache ==
/// Type-erased administration surface shared by every `NamespacedCache<V>`.
pub trait ManagedCache: Send + Sync {
    fn name(&self) -> &str;
    fn value_type(&self) -> &'static str;
    fn len(&self) -> usize;
    fn stats(&self) -> CacheStats;
    fn clear(&self) -> usize;
    fn delete(&self, namespace: &str, key: &str) -> bool;
    fn delete_namespace(&self, namespace: &str) -> usize;
    fn invalidate_matching(&self, pattern: &KeyPattern, namespace: Option<&str>) -> usize;
    fn destroy(&self);
    fn as_any(&self) -> &dyn Any;
}

impl<V: Send + Sync + 'static> ManagedCache for NamespacedCache<V> {
    fn name(&self) -> &str {
        NamespacedCache::name(self)
    }

    fn value_type(&self) -> &'static str {
        type_name::<V>()
    }

    fn len(&self) -> usize {
        NamespacedCache::len(self)
    }

    fn stats(&self) -> CacheStats {
        NamespacedCache::stats(self)
    }

    fn clear(&self) -> usize {
        NamespacedCache::clear(self)
    }

    fn delete(&self, namespace: &str, key: &str) -> bool {
        NamespacedCache::delete(self, namespace, key)
    }

    fn delete_namespace(&self, namespace: &str) -> usize {
        NamespacedCache::delete_namespace(self, namespace)
    }

    fn invalidate_matching(&self, pattern: &KeyPattern, namespace: Option<&str>) -> usize {
        NamespacedCache::invalidate_matching(self, pattern, namespace)
    }

    fn destroy(&self) {
        NamespacedCache::destroy(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct RegistryInner {
    config: Config,
    caches: Mutex<BTreeMap<String, Arc<dyn ManagedCache>>>,
    shut_down: AtomicBool,
}

// == Cache Registry ==
/// Process-wide set of caches, one per logical purpose.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct CacheRegistry {
    inner: Arc<RegistryInner>,
}

impl CacheRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                caches: Mutex::new(BTreeMap::new()),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Returns the cache named `name`, creating it on first use.
    ///
    /// A new cache takes its settings from the config and starts its sweep
    /// task. Requesting an existing name with another value type fails.
    pub fn cache<V: Send + Sync + 'static>(&self, name: &str) -> Result<NamespacedCache<V>> {
        // The flag is only flipped under this lock, so a cache inserted here
        // is always seen by `shutdown`.
        let mut caches = self.inner.caches.lock();
        if self.is_shut_down() {
            return Err(CacheError::ShutDown);
        }

        if let Some(existing) = caches.get(name) {
            return existing
                .as_any()
                .downcast_ref::<NamespacedCache<V>>()
                .cloned()
                .ok_or_else(|| {
                    CacheError::TypeMismatch(format!(
                        "cache '{name}' holds {}, not {}",
                        existing.value_type(),
                        type_name::<V>()
                    ))
                });
        }

        let settings = self.inner.config.settings_for(name);
        info!(
            cache = name,
            max_entries = settings.max_entries,
            eviction = %settings.eviction,
            "creating cache"
        );
        let cache = NamespacedCache::<V>::new(name, settings);
        cache.start_sweeper();
        caches.insert(name.to_string(), Arc::new(cache.clone()));
        Ok(cache)
    }

    /// Names of every cache created so far.
    pub fn names(&self) -> Vec<String> {
        self.inner.caches.lock().keys().cloned().collect()
    }

    fn lookup(&self, name: &str) -> Result<Arc<dyn ManagedCache>> {
        self.inner
            .caches
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::UnknownCache(name.to_string()))
    }

    pub fn stats(&self) -> BTreeMap<String, CacheStats> {
        self.inner
            .caches
            .lock()
            .iter()
            .map(|(name, cache)| (name.clone(), cache.stats()))
            .collect()
    }

    pub fn stats_for(&self, name: &str) -> Result<CacheStats> {
        Ok(self.lookup(name)?.stats())
    }

    pub fn clear(&self, name: &str) -> Result<usize> {
        Ok(self.lookup(name)?.clear())
    }

    pub fn delete(&self, name: &str, namespace: &str, key: &str) -> Result<bool> {
        Ok(self.lookup(name)?.delete(namespace, key))
    }

    pub fn delete_namespace(&self, name: &str, namespace: &str) -> Result<usize> {
        Ok(self.lookup(name)?.delete_namespace(namespace))
    }

    pub fn invalidate_matching(
        &self,
        name: &str,
        pattern: &KeyPattern,
        namespace: Option<&str>,
    ) -> Result<usize> {
        Ok(self.lookup(name)?.invalidate_matching(pattern, namespace))
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    // == Shutdown ==
    /// Destroys every cache. Later calls do nothing.
    pub fn shutdown(&self) {
        let caches = self.inner.caches.lock();
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        for cache in caches.values() {
            cache.destroy();
        }
        info!(caches = caches.len(), "cache registry shut down");
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("caches", &self.names())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EvictionPolicy;
    use crate::config::CacheSettings;
    use std::time::Duration;

    const MINUTE: Duration = Duration::from_secs(60);

    #[derive(Debug, PartialEq)]
    struct Points {
        total: u32,
    }

    #[tokio::test]
    async fn test_cache_is_created_once() {
        let registry = CacheRegistry::new(Config::default());

        let first = registry.cache::<Points>("student-data").unwrap();
        first.set("points", "student-1", Points { total: 50 }, MINUTE);

        let second = registry.cache::<Points>("student-data").unwrap();
        assert_eq!(
            second.get("points", "student-1").as_deref(),
            Some(&Points { total: 50 })
        );
        assert_eq!(registry.names(), vec!["student-data".to_string()]);
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let registry = CacheRegistry::new(Config::default());
        registry.cache::<Points>("student-data").unwrap();

        let err = registry.cache::<String>("student-data").unwrap_err();
        assert!(matches!(err, CacheError::TypeMismatch(_)));
    }

    #[tokio::test]
    async fn test_named_settings_are_applied() {
        let config = Config::default().with_cache(
            "leaderboards",
            CacheSettings::default()
                .with_max_entries(5)
                .with_eviction(EvictionPolicy::ExpiryBatch),
        );
        let registry = CacheRegistry::new(config);

        let leaderboards = registry.cache::<Vec<u32>>("leaderboards").unwrap();
        let students = registry.cache::<Points>("student-data").unwrap();

        assert_eq!(leaderboards.settings().max_entries, 5);
        assert_eq!(leaderboards.eviction_policy(), EvictionPolicy::ExpiryBatch);
        assert_eq!(students.settings().max_entries, 1000);
        assert!(leaderboards.is_sweeping());
    }

    #[tokio::test]
    async fn test_admin_operations_by_name() {
        let registry = CacheRegistry::new(Config::default());
        let cache = registry.cache::<u32>("leaderboards").unwrap();
        cache.set("leaderboard", "class:1:daily", 1, MINUTE);
        cache.set("leaderboard", "class:2:daily", 2, MINUTE);
        cache.set("points", "student-1", 3, MINUTE);

        assert_eq!(registry.delete_namespace("leaderboards", "leaderboard").unwrap(), 2);
        assert!(registry.delete("leaderboards", "points", "student-1").unwrap());
        assert!(!registry.delete("leaderboards", "points", "student-1").unwrap());
        assert_eq!(registry.stats_for("leaderboards").unwrap().total_entries, 0);

        let err = registry.clear("missing").unwrap_err();
        assert!(matches!(err, CacheError::UnknownCache(_)));
    }

    #[tokio::test]
    async fn test_shutdown_destroys_caches() {
        let registry = CacheRegistry::new(Config::default());
        let cache = registry.cache::<u32>("analytics").unwrap();
        cache.set("analytics", "teacher-7", 7, MINUTE);
        assert!(cache.is_sweeping());

        registry.shutdown();
        registry.shutdown();

        assert!(cache.is_empty());
        assert!(!cache.is_sweeping());
        assert!(matches!(
            registry.cache::<u32>("analytics"),
            Err(CacheError::ShutDown)
        ));
    }

    #[test]
    fn test_cache_racing_shutdown_never_outlives_it() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        for _ in 0..200 {
            let registry = CacheRegistry::new(Config::default());
            let barrier = Arc::new(std::sync::Barrier::new(2));

            let creator = {
                let registry = registry.clone();
                let barrier = barrier.clone();
                let handle = runtime.handle().clone();
                std::thread::spawn(move || {
                    let _guard = handle.enter();
                    barrier.wait();
                    registry.cache::<u32>("leaderboards")
                })
            };
            let stopper = {
                let registry = registry.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.shutdown();
                })
            };

            let created = creator.join().unwrap();
            stopper.join().unwrap();

            match created {
                // Created before shutdown, so shutdown must have destroyed it
                Ok(cache) => assert!(!cache.is_sweeping()),
                Err(err) => assert!(matches!(err, CacheError::ShutDown)),
            }
            assert!(registry.cache::<u32>("leaderboards").is_err());
        }
    }

    #[test]
    fn test_cache_without_runtime_skips_sweep() {
        let registry = CacheRegistry::new(Config::default());
        let cache = registry.cache::<u32>("topics").unwrap();

        cache.set("topics", "class-3", 3, MINUTE);
        assert_eq!(cache.get("topics", "class-3").as_deref(), Some(&3));
        assert!(!cache.is_sweeping());
    }
}
