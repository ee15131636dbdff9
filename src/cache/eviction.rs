//! Eviction Policy Module
//!
//! Chooses which entries to drop when an insert would push a cache past its
//! capacity.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntry, CacheKey};

/// Share of the store removed by one `ExpiryBatch` eviction (1 in N entries).
pub const EXPIRY_BATCH_DIVISOR: usize = 10;

// == Eviction Policy ==
/// Size-bound eviction strategy, chosen per cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Drop the single entry with the oldest `last_accessed`.
    #[default]
    Lru,
    /// Drop roughly a tenth of the store, soonest-to-expire first.
    ExpiryBatch,
}

impl EvictionPolicy {
    /// Returns the keys to remove so that one more entry fits.
    ///
    /// Always returns at least one key for a non-empty store.
    pub fn select_victims<V>(&self, entries: &HashMap<CacheKey, CacheEntry<V>>) -> Vec<CacheKey> {
        match self {
            EvictionPolicy::Lru => entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| vec![key.clone()])
                .unwrap_or_default(),
            EvictionPolicy::ExpiryBatch => {
                let batch = (entries.len() / EXPIRY_BATCH_DIVISOR).max(1);
                let mut by_expiry: Vec<_> = entries
                    .iter()
                    .map(|(key, entry)| (entry.expires_at, key))
                    .collect();
                by_expiry.sort_unstable();
                by_expiry
                    .into_iter()
                    .take(batch)
                    .map(|(_, key)| key.clone())
                    .collect()
            }
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Lru => f.write_str("lru"),
            EvictionPolicy::ExpiryBatch => f.write_str("expiry_batch"),
        }
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "expiry" | "expiry_batch" | "expiry-batch" => Ok(EvictionPolicy::ExpiryBatch),
            other => Err(format!("unknown eviction policy '{other}'")),
        }
    }
}
