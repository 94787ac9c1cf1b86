//! Session cache with insertion-order eviction and fixed TTL.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::CacheConfig;

/// Entry stored in the cache.
///
/// Entries are immutable once inserted. Re-verifying a session replaces the
/// whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Cached value.
    pub value: V,

    /// When this entry was inserted into cache.
    pub cached_at: Instant,

    /// Instant from which the entry is no longer trusted.
    pub expires_at: Instant,
}

/// Stand-in expiry when `now + ttl` overflows the clock (roughly 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

impl<V> CacheEntry<V> {
    /// Create a new cache entry that expires `ttl` from now.
    pub fn new(value: V, ttl: Duration) -> Self {
        let cached_at = Instant::now();
        Self {
            value,
            cached_at,
            expires_at: cached_at
                .checked_add(ttl)
                .unwrap_or_else(|| cached_at + FAR_FUTURE),
        }
    }

    /// Whether the entry has expired as of `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Whether the entry has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

/// Bounded session cache with FIFO eviction and fixed TTL.
///
/// The underlying [`LruCache`] is used strictly as an insertion-ordered map:
/// reads go through `peek`, which never reorders, so the "least recently
/// used" slot is always the oldest insertion. Re-inserting a key moves it to
/// the newest position without evicting anything.
///
/// Clones share the same storage.
pub struct SessionCache<V> {
    inner: Arc<RwLock<LruCache<String, CacheEntry<V>>>>,
    config: CacheConfig,
}

impl<V: Clone> SessionCache<V> {
    /// Create a new, empty session cache.
    pub fn new(config: CacheConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_size).unwrap_or(NonZeroUsize::MIN);

        Self {
            inner: Arc::new(RwLock::new(LruCache::new(cap))),
            config,
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the current number of cached entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Look up a live entry.
    ///
    /// An expired entry is removed and reported as absent. A hit does not
    /// change the entry's eviction position.
    pub async fn lookup(&self, session_id: &str) -> Option<V> {
        let mut inner = self.inner.write().await;

        match inner.peek(session_id) {
            None => return None,
            Some(entry) if !entry.is_expired() => {
                trace!(session_id = %session_id, "Session found in cache");
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }

        inner.pop(session_id);
        debug!(session_id = %session_id, "Session expired, removing from cache");
        None
    }

    /// Insert a verified session.
    ///
    /// When the cache is full and the key is new, the oldest insertion is
    /// evicted first. An existing key is overwritten and becomes the newest.
    pub async fn insert(&self, session_id: &str, value: V) {
        let mut inner = self.inner.write().await;

        if inner.len() >= self.config.max_size
            && !inner.contains(session_id)
            && let Some((evicted_id, _)) = inner.pop_lru()
        {
            debug!(session_id = %evicted_id, "Evicting oldest session to make room");
        }

        inner.put(
            session_id.to_string(),
            CacheEntry::new(value, self.config.ttl),
        );

        trace!(
            session_id = %session_id,
            cache_size = inner.len(),
            "Session inserted into cache"
        );
    }

    /// Remove a session from the cache.
    ///
    /// Returns `true` if an entry was present. Absent keys are a no-op.
    pub async fn invalidate(&self, session_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.pop(session_id).is_some();
        if removed {
            debug!(session_id = %session_id, "Session invalidated from cache");
        }
        removed
    }

    /// Check if a live entry exists, without side effects.
    pub async fn contains(&self, session_id: &str) -> bool {
        let inner = self.inner.read().await;
        inner.peek(session_id).is_some_and(|e| !e.is_expired())
    }

    /// Peek at an entry (expired or not) without removing it.
    pub async fn peek_entry(&self, session_id: &str) -> Option<CacheEntry<V>> {
        self.inner.read().await.peek(session_id).cloned()
    }

    /// Cached session IDs, oldest insertion first.
    pub async fn session_ids(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        inner.iter().rev().map(|(id, _)| id.clone()).collect()
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    /// Clean up expired entries.
    ///
    /// This is called by the cleanup task when `enable_cleanup_task` is true,
    /// but can also be called manually.
    pub async fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        let now = Instant::now();

        let expired: Vec<String> = inner
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(id, _)| id.clone())
            .collect();

        for session_id in &expired {
            inner.pop(session_id);
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "Cleaned up expired sessions");
        }

        expired.len()
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        CacheStats {
            size: inner.len(),
            capacity: self.config.max_size,
            ttl: self.config.ttl,
        }
    }
}

impl<V: Clone + Send + Sync + 'static> SessionCache<V> {
    /// Spawn the periodic expiry sweep.
    ///
    /// Returns `None` when the sweep is disabled in the configuration.
    /// The task runs until the returned handle is aborted.
    pub fn spawn_cleanup_task(&self) -> Option<JoinHandle<()>> {
        if !self.config.enable_cleanup_task {
            return None;
        }

        let cache = self.clone();
        let period = self.config.cleanup_interval;

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.cleanup_expired().await;
            }
        }))
    }
}

impl<V> Clone for SessionCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of cached entries.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Configured entry lifetime.
    pub ttl: Duration,
}
