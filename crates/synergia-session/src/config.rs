//! Configuration for the session cache.

use std::time::Duration;

/// Default maximum number of verified sessions to cache.
pub const DEFAULT_MAX_SIZE: usize = 1_000;

/// Default lifetime of a cached verification (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default interval for the background expiry sweep.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the session cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before the oldest insertion is evicted.
    pub max_size: usize,

    /// Lifetime of an entry, measured from insertion.
    /// Reads never extend it.
    pub ttl: Duration,

    /// Whether to run periodic cleanup of expired entries.
    /// If false, expired entries are only removed when looked up or evicted.
    pub enable_cleanup_task: bool,

    /// Interval for the cleanup task (if enabled).
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl: DEFAULT_TTL,
            enable_cleanup_task: false,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached sessions.
    pub fn with_max_size(mut self, max: usize) -> Self {
        self.max_size = max;
        self
    }

    /// Set the TTL for cached sessions.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable the background cleanup task.
    pub fn with_cleanup_task(mut self, enabled: bool) -> Self {
        self.enable_cleanup_task = enabled;
        self
    }

    /// Set the cleanup interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}
