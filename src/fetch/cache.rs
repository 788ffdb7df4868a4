//! Bounded TTL cache for upstream results.
//!
//! Keyed by `(service id, raw target URL)`. Entries expire after a fixed
//! time-to-live and the least recently used entry is evicted at capacity.

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::time::Duration;
use tracing::debug;

/// Cache of normalized results keyed by service and submitted URL
#[derive(Clone)]
pub struct ResultCache<V> {
    cache: Cache<(String, String), V>,
}

impl<V: Clone + Send + Sync + 'static> ResultCache<V> {
    /// Creates a cache holding at most `max_capacity` entries for `ttl` each.
    ///
    /// # Examples
    ///
    /// ```
    /// use bypass_relay::fetch::ResultCache;
    /// use std::time::Duration;
    ///
    /// let cache: ResultCache<String> = ResultCache::new(Duration::from_secs(7200), 200);
    /// ```
    #[must_use]
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { cache }
    }

    /// Returns the live entry for `(service, url)`, if any.
    pub async fn get(&self, service: &str, url: &str) -> Option<V> {
        let hit = self
            .cache
            .get(&(service.to_string(), url.to_string()))
            .await;
        if hit.is_some() {
            debug!("Cache hit for [{service}] {url}");
        }
        hit
    }

    /// Stores `value` for `(service, url)`.
    pub async fn insert(&self, service: &str, url: &str, value: V) {
        self.cache
            .insert((service.to_string(), url.to_string()), value)
            .await;
    }

    /// Approximate number of live entries.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
