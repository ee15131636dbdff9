//! Configuration Module
//!
//! Cache sizing, eviction, sweep and TTL settings, loaded from environment
//! variables with defaults.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use crate::cache::EvictionPolicy;

/// TTL category used when a caller does not name one.
pub const DEFAULT_CATEGORY: &str = "default";

/// Default per-category TTLs in seconds.
///
/// User-specific data turns over quickly; all-time aggregates are expensive
/// and rarely change.
const DEFAULT_CATEGORY_TTLS: &[(&str, u64)] = &[
    ("user", 2 * 60),
    ("class", 5 * 60),
    ("analytics", 10 * 60),
    ("leaderboard_daily", 5 * 60),
    ("leaderboard_weekly", 30 * 60),
    ("leaderboard_monthly", 60 * 60),
    ("leaderboard_all_time", 6 * 60 * 60),
];

// == TTL Table ==
/// Named TTL categories resolved by [`NamespacedCache::fetch`](crate::cache::NamespacedCache::fetch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlTable {
    categories: BTreeMap<String, Duration>,
}

impl TtlTable {
    /// Builds the standard table with `default_ttl` as the `default` category.
    pub fn with_default(default_ttl: Duration) -> Self {
        let mut categories: BTreeMap<String, Duration> = DEFAULT_CATEGORY_TTLS
            .iter()
            .map(|(name, secs)| (name.to_string(), Duration::from_secs(*secs)))
            .collect();
        categories.insert(DEFAULT_CATEGORY.to_string(), default_ttl);
        Self { categories }
    }

    pub fn get(&self, category: &str) -> Option<Duration> {
        self.categories.get(category).copied()
    }

    pub fn insert(&mut self, category: impl Into<String>, ttl: Duration) {
        self.categories.insert(category.into(), ttl);
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.categories.iter().map(|(name, ttl)| (name.as_str(), *ttl))
    }
}

impl Default for TtlTable {
    fn default() -> Self {
        Self::with_default(Duration::from_secs(300))
    }
}

// == Cache Settings ==
/// Tuning for one cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// What to drop when the cache is full
    pub eviction: EvictionPolicy,
    /// Interval of the background expiry sweep, `None` disables it
    pub sweep_interval: Option<Duration>,
    /// TTL categories for `fetch`
    pub ttls: TtlTable,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            eviction: EvictionPolicy::Lru,
            sweep_interval: Some(Duration::from_secs(60)),
            ttls: TtlTable::default(),
        }
    }
}

impl CacheSettings {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_ttl(mut self, category: impl Into<String>, ttl: Duration) -> Self {
        self.ttls.insert(category, ttl);
        self
    }
}

/// Server and cache configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin HTTP server port
    pub server_port: u16,
    /// Settings for caches without an explicit entry in `caches`
    pub defaults: CacheSettings,
    /// Per-cache overrides keyed by cache name
    pub caches: BTreeMap<String, CacheSettings>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    /// - `CACHE_MAX_ENTRIES` - Entries per cache (default: 1000)
    /// - `CACHE_EVICTION` - `lru` or `expiry` (default: lru)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep period in seconds, 0 disables (default: 60)
    /// - `CACHE_DEFAULT_TTL` - TTL of the `default` category in seconds (default: 300)
    /// - `CACHE_TTL_<CATEGORY>` - TTL override in seconds for one category
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Builds a Config from an explicit set of variables.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();
        let parse = |name: &str| vars.get(name).and_then(|v| v.trim().parse::<u64>().ok());

        let default_ttl = parse("CACHE_DEFAULT_TTL").unwrap_or(300);
        let mut ttls = TtlTable::with_default(Duration::from_secs(default_ttl));
        for (name, value) in &vars {
            let Some(category) = name.strip_prefix("CACHE_TTL_") else {
                continue;
            };
            if let Ok(secs) = value.trim().parse::<u64>() {
                ttls.insert(category.to_ascii_lowercase(), Duration::from_secs(secs));
            }
        }

        let sweep_interval = match parse("CACHE_SWEEP_INTERVAL").unwrap_or(60) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            server_port: vars
                .get("SERVER_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(3000),
            defaults: CacheSettings {
                max_entries: parse("CACHE_MAX_ENTRIES")
                    .and_then(|n| usize::try_from(n).ok())
                    .unwrap_or(1000),
                eviction: vars
                    .get("CACHE_EVICTION")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default(),
                sweep_interval,
                ttls,
            },
            caches: BTreeMap::new(),
        }
    }

    /// Registers settings for one named cache.
    pub fn with_cache(mut self, name: impl Into<String>, settings: CacheSettings) -> Self {
        self.caches.insert(name.into(), settings);
        self
    }

    /// Settings for `name`, falling back to the defaults.
    pub fn settings_for(&self, name: &str) -> CacheSettings {
        self.caches
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            defaults: CacheSettings::default(),
            caches: BTreeMap::new(),
        }
    }
}
