//! Cache Entry Module
//!
//! Defines individual cache entries with expiry and access metadata, and the
//! composite namespace/key used to address them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// Upper bound applied when `now + ttl` does not fit in an `Instant`.
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

// == Cache Key ==
/// Composite address of a cache entry: a namespace plus a caller key.
///
/// Rendered as `namespace:key`. Namespaces may themselves contain `:` to form
/// a hierarchy, in which case `leaderboard:class` lives inside `leaderboard`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    namespace: String,
    key: String,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the composite key starts with `namespace:`.
    pub fn in_namespace(&self, namespace: &str) -> bool {
        match self.namespace.strip_prefix(namespace) {
            Some(rest) => rest.is_empty() || rest.starts_with(':'),
            None => false,
        }
    }

    /// The `namespace:key` string form.
    pub fn composite(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.key)
    }
}

// == Cache Entry ==
/// A single cached value with expiry and access metadata.
///
/// The value is held behind an `Arc`; reads hand out clones of the pointer,
/// never copies of the value.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: Arc<V>,
    /// When the entry was stored
    pub created_at: Instant,
    /// The entry is logically absent once `now >= expires_at`
    pub expires_at: Instant,
    /// Last successful read (or the insert time)
    pub last_accessed: Instant,
    /// Number of successful reads
    pub access_count: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` from now.
    pub fn new(value: Arc<V>, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + MAX_TTL);

        Self {
            value,
            created_at: now,
            expires_at,
            last_accessed: now,
            access_count: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired as soon as the current time reaches `expires_at`,
    /// so a zero TTL produces an entry that is never observable.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, now: Instant) {
        self.last_accessed = now;
        self.access_count += 1;
    }

    // == Time To Live ==
    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = CacheKey::new("points", "student-1");
        assert_eq!(key.to_string(), "points:student-1");
        assert_eq!(key.composite(), "points:student-1");
    }

    #[test]
    fn test_key_in_namespace() {
        let key = CacheKey::new("leaderboard", "class:1:daily");
        assert!(key.in_namespace("leaderboard"));
        assert!(!key.in_namespace("leader"));
        assert!(!key.in_namespace("points"));

        let nested = CacheKey::new("leaderboard:class", "1");
        assert!(nested.in_namespace("leaderboard"));
        assert!(nested.in_namespace("leaderboard:class"));
        assert!(!nested.in_namespace("leaderboard:cl"));
    }

    #[test]
    fn test_keys_in_different_namespaces_differ() {
        assert_ne!(CacheKey::new("a", "k"), CacheKey::new("b", "k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expiration() {
        let entry = CacheEntry::new(Arc::new("value"), Duration::from_secs(5));
        assert!(!entry.is_expired());

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert!(!entry.is_expired());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_remaining() {
        let entry = CacheEntry::new(Arc::new(1u32), Duration::from_secs(10));
        assert_eq!(entry.ttl_remaining(), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(entry.ttl_remaining(), Duration::from_secs(6));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new(Arc::new(()), Duration::ZERO);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let entry = CacheEntry::new(Arc::new(()), Duration::MAX);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_touch_updates_access_metadata() {
        let mut entry = CacheEntry::new(Arc::new(()), Duration::from_secs(60));
        let later = entry.created_at + Duration::from_secs(1);

        entry.touch(later);
        entry.touch(later);

        assert_eq!(entry.last_accessed, later);
        assert_eq!(entry.access_count, 2);
    }
}
