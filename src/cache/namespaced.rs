//! Namespaced Cache Module
//!
//! Thread-safe, typed cache handle combining the store with a registry of
//! in-flight computations, so concurrent misses for one key compute once.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheStats, CacheStore, EvictionPolicy, KeyPattern};
use crate::config::CacheSettings;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_sweep_task;

type ComputeResult<V> = Result<Arc<V>>;
type ComputationChannel<V> = Shared<oneshot::Receiver<ComputeResult<V>>>;

/// Runs a closure when dropped, including during unwinding.
struct CallOnDrop {
    f: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl CallOnDrop {
    fn new<F: FnOnce() + Send + 'static>(f: F) -> Self {
        Self {
            f: Some(Box::new(f)),
        }
    }
}

impl Drop for CallOnDrop {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

struct State<V> {
    store: CacheStore<V>,
    /// In-flight computations keyed like the store
    pending: HashMap<CacheKey, ComputationChannel<V>>,
    /// Set by `destroy`; late computation results are no longer stored
    destroyed: bool,
}

struct Inner<V> {
    name: String,
    settings: CacheSettings,
    state: Mutex<State<V>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

// == Namespaced Cache ==
/// A typed, namespaced TTL cache with request deduplication.
///
/// Cloning is cheap and yields another handle to the same cache.
pub struct NamespacedCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for NamespacedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> std::fmt::Debug for NamespacedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedCache")
            .field("name", &self.inner.name)
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

/// A handle that does not keep the cache alive.
pub struct WeakNamespacedCache<V> {
    inner: Weak<Inner<V>>,
}

impl<V> WeakNamespacedCache<V> {
    pub fn upgrade(&self) -> Option<NamespacedCache<V>> {
        self.inner.upgrade().map(|inner| NamespacedCache { inner })
    }
}

impl<V: Send + Sync + 'static> NamespacedCache<V> {
    // == Constructor ==
    /// Creates a cache without starting its sweep task.
    pub fn new(name: impl Into<String>, settings: CacheSettings) -> Self {
        let store = CacheStore::new(settings.max_entries, settings.eviction);
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                settings,
                state: Mutex::new(State {
                    store,
                    pending: HashMap::new(),
                    destroyed: false,
                }),
                sweeper: Mutex::new(None),
            }),
        }
    }

    /// Starts the periodic expiry sweep if one is configured.
    ///
    /// Needs a tokio runtime; without one the cache relies on lazy expiry
    /// alone. Calling it again while a sweep is running does nothing.
    pub fn start_sweeper(&self) {
        let Some(interval) = self.inner.settings.sweep_interval else {
            return;
        };
        if tokio::runtime::Handle::try_current().is_err() {
            warn!(cache = %self.inner.name, "no tokio runtime, periodic sweep disabled");
            return;
        }

        let mut sweeper = self.inner.sweeper.lock();
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        *sweeper = Some(spawn_sweep_task(self.downgrade(), interval));
    }

    pub fn downgrade(&self) -> WeakNamespacedCache<V> {
        WeakNamespacedCache {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.inner.settings
    }

    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.inner.settings.eviction
    }

    // == Set ==
    /// Stores `value` under `namespace:key` for `ttl`.
    pub fn set(&self, namespace: &str, key: &str, value: V, ttl: Duration) {
        self.set_shared(namespace, key, Arc::new(value), ttl);
    }

    /// Stores an already shared value.
    pub fn set_shared(&self, namespace: &str, key: &str, value: Arc<V>, ttl: Duration) {
        self.inner
            .state
            .lock()
            .store
            .set(CacheKey::new(namespace, key), value, ttl);
    }

    // == Get ==
    /// Returns the fresh value under `namespace:key`, if any.
    pub fn get(&self, namespace: &str, key: &str) -> Option<Arc<V>> {
        self.inner
            .state
            .lock()
            .store
            .get(&CacheKey::new(namespace, key))
    }

    /// Whether a fresh value exists, without counting a lookup.
    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.inner
            .state
            .lock()
            .store
            .peek(&CacheKey::new(namespace, key))
            .is_some()
    }

    /// Remaining lifetime of a fresh entry.
    pub fn ttl_remaining(&self, namespace: &str, key: &str) -> Option<Duration> {
        self.inner
            .state
            .lock()
            .store
            .peek(&CacheKey::new(namespace, key))
            .map(|entry| entry.ttl_remaining())
    }

    // == Delete ==
    /// Removes one entry; returns whether it existed.
    pub fn delete(&self, namespace: &str, key: &str) -> bool {
        self.inner
            .state
            .lock()
            .store
            .delete(&CacheKey::new(namespace, key))
    }

    /// Removes every entry in `namespace` (and its nested namespaces).
    pub fn delete_namespace(&self, namespace: &str) -> usize {
        let removed = self.inner.state.lock().store.delete_namespace(namespace);
        debug!(cache = %self.inner.name, namespace, removed, "invalidated namespace");
        removed
    }

    // == Invalidation Helpers ==
    /// Deletes `key` under each of `namespaces`, e.g. every cached view of
    /// one student.
    pub fn invalidate_entity(&self, namespaces: &[&str], key: &str) -> usize {
        let mut state = self.inner.state.lock();
        let removed = namespaces
            .iter()
            .filter(|namespace| state.store.delete(&CacheKey::new(**namespace, key)))
            .count();
        debug!(cache = %self.inner.name, key, removed, "invalidated entity");
        removed
    }

    /// Deletes entries matched by `pattern`, within one namespace or across
    /// all of them.
    pub fn invalidate_matching(&self, pattern: &KeyPattern, namespace: Option<&str>) -> usize {
        let removed = self
            .inner
            .state
            .lock()
            .store
            .delete_matching(pattern, namespace);
        debug!(cache = %self.inner.name, ?pattern, ?namespace, removed, "invalidated by pattern");
        removed
    }

    // == Clear ==
    pub fn clear(&self) -> usize {
        let removed = self.inner.state.lock().store.clear();
        info!(cache = %self.inner.name, removed, "cache cleared");
        removed
    }

    /// Drops expired entries; the sweep task calls this on every tick.
    pub fn purge_expired(&self) -> usize {
        self.inner.state.lock().store.cleanup_expired()
    }

    // == Destroy ==
    /// Stops the sweep task and clears all entries. Safe to call repeatedly.
    ///
    /// Computations already in flight still run to completion and reach
    /// their callers, but their results are not stored.
    pub fn destroy(&self) {
        if let Some(handle) = self.inner.sweeper.lock().take() {
            handle.abort();
            debug!(cache = %self.inner.name, "sweep task stopped");
        }
        let mut state = self.inner.state.lock();
        state.destroyed = true;
        state.store.clear();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.state.lock().destroyed
    }

    pub fn is_sweeping(&self) -> bool {
        self.inner
            .sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock();
        let mut stats = state.store.stats();
        stats.in_flight = state.pending.len();
        stats
    }

    // == Get Or Set ==
    /// Returns the cached value, or computes, caches and returns it.
    ///
    /// Concurrent callers missing on the same key share one computation and
    /// all receive its outcome. A failed computation caches nothing and the
    /// next call retries. Inside a tokio runtime the computation runs on its
    /// own task and finishes even if every caller goes away; elsewhere it is
    /// driven inline by the first caller.
    pub async fn get_or_set<F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let cache_key = CacheKey::new(namespace, key);

        // Lookup and registration share one critical section.
        let lookup = {
            let mut state = self.inner.state.lock();
            if let Some(value) = state.store.get(&cache_key) {
                Lookup::Hit(value)
            } else if let Some(channel) = state.pending.get(&cache_key).cloned() {
                state.store.stats_mut().record_dedup();
                Lookup::Join(channel)
            } else {
                let (sender, receiver) = oneshot::channel();
                let channel = receiver.shared();
                state.pending.insert(cache_key.clone(), channel.clone());
                state.store.stats_mut().record_compute();
                Lookup::Compute(sender, channel)
            }
        };

        let (sender, channel) = match lookup {
            Lookup::Hit(value) => return Ok(value),
            Lookup::Join(channel) => {
                debug!(cache = %self.inner.name, key = %cache_key, "joined in-flight computation");
                return self.await_channel(channel).await;
            }
            Lookup::Compute(sender, channel) => (sender, channel),
        };

        // From here on the registry entry is removed however the computation ends.
        let remove_pending = {
            let inner = Arc::clone(&self.inner);
            let key = cache_key.clone();
            CallOnDrop::new(move || {
                inner.state.lock().pending.remove(&key);
            })
        };

        debug!(cache = %self.inner.name, key = %cache_key, "computing value");
        let computation = compute();
        let inner = Arc::clone(&self.inner);

        let task = async move {
            let outcome = match AssertUnwindSafe(computation).catch_unwind().await {
                Ok(Ok(value)) => {
                    let value = Arc::new(value);
                    let mut state = inner.state.lock();
                    if state.destroyed {
                        debug!(cache = %inner.name, key = %cache_key, "cache destroyed, result not stored");
                    } else {
                        state.store.set(cache_key, Arc::clone(&value), ttl);
                    }
                    Ok(value)
                }
                Ok(Err(err)) => {
                    inner.state.lock().store.stats_mut().record_compute_failure();
                    warn!(cache = %inner.name, key = %cache_key, error = %format!("{err:#}"), "computation failed");
                    Err(CacheError::compute(err))
                }
                Err(panic) => {
                    inner.state.lock().store.stats_mut().record_compute_failure();
                    let message = panic_message(panic.as_ref());
                    warn!(cache = %inner.name, key = %cache_key, panic = %message, "computation panicked");
                    Err(CacheError::ComputeAborted(message))
                }
            };
            // Stored before unregistering, so a caller arriving in between hits.
            drop(remove_pending);
            sender.send(outcome).ok();
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => task.await,
        }

        self.await_channel(channel).await
    }

    /// Like [`get_or_set`](Self::get_or_set) with the TTL taken from a named
    /// category.
    ///
    /// An unknown category bypasses the cache: `compute` runs directly and
    /// nothing is stored.
    pub async fn fetch<F, Fut>(
        &self,
        category: &str,
        namespace: &str,
        key: &str,
        compute: F,
    ) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        match self.inner.settings.ttls.get(category) {
            Some(ttl) => self.get_or_set(namespace, key, ttl, compute).await,
            None => {
                warn!(cache = %self.inner.name, category, "unknown TTL category, bypassing cache");
                compute().await.map(Arc::new).map_err(CacheError::compute)
            }
        }
    }

    async fn await_channel(&self, channel: ComputationChannel<V>) -> Result<Arc<V>> {
        channel.await.unwrap_or_else(|_canceled| {
            Err(CacheError::ComputeAborted(format!(
                "{} computation dropped before completing",
                self.inner.name
            )))
        })
    }
}

enum Lookup<V> {
    Hit(Arc<V>),
    Join(ComputationChannel<V>),
    Compute(oneshot::Sender<ComputeResult<V>>, ComputationChannel<V>),
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "computation panicked".to_string()
    }
}
