//! Cache configuration and policies

use crate::error::{MediaError, Result};
use core_runtime::config::{
    CoreConfig, DEFAULT_CACHE_MAX_AGE_SECS, DEFAULT_CACHE_SIZE_MB, DEFAULT_COMPRESSION_LEVEL,
    DEFAULT_SIGNED_URL_TTL_SECS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the media cache manager.
///
/// [`validate`](Self::validate) requires `max_age` to be strictly shorter than
/// `signed_url_ttl_secs`. A cached URL must never outlive its signature, so a
/// configuration such as a 2 hour `max_age` with a 1 hour TTL is rejected with
/// [`MediaError::InvalidConfig`] instead of serving expired signatures.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Aggregate nominal-size budget in bytes (default: 50MB)
    pub max_size_bytes: u64,

    /// Lifetime of a cached URL; must be shorter than the signed URL lifetime
    /// (default: 30 minutes)
    pub max_age: Duration,

    /// Advisory quality (0-100) for the derivative generation job; not
    /// enforced client-side (default: 80)
    pub compression_level: u8,

    /// Which entry goes first when over budget
    pub eviction_policy: EvictionPolicy,

    /// Pause between tiers during progressive loading (default: 150ms)
    pub tier_upgrade_delay: Duration,

    /// Lifetime requested for each signed URL (default: 3600s)
    pub signed_url_ttl_secs: u64,

    /// Persist `last_accessed` after each successful resolve (default: true)
    pub track_last_accessed: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_CACHE_SIZE_MB * 1024 * 1024,
            max_age: Duration::from_secs(DEFAULT_CACHE_MAX_AGE_SECS),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            eviction_policy: EvictionPolicy::InsertionOrder,
            tier_upgrade_delay: Duration::from_millis(150),
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
            track_last_accessed: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the aggregate nominal-size budget.
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size_bytes = bytes;
        self
    }

    /// Set how long a resolved URL stays cached.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = level;
        self
    }

    /// Set eviction policy.
    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    /// Set the pause between progressive tiers; zero disables it.
    pub fn with_tier_upgrade_delay(mut self, delay: Duration) -> Self {
        self.tier_upgrade_delay = delay;
        self
    }

    pub fn with_signed_url_ttl(mut self, ttl_secs: u64) -> Self {
        self.signed_url_ttl_secs = ttl_secs;
        self
    }

    pub fn with_last_accessed_tracking(mut self, enabled: bool) -> Self {
        self.track_last_accessed = enabled;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_size_bytes == 0 {
            return Err(MediaError::InvalidConfig(
                "max_size_bytes must be greater than 0".to_string(),
            ));
        }

        if self.max_age.is_zero() {
            return Err(MediaError::InvalidConfig(
                "max_age must be greater than 0".to_string(),
            ));
        }

        if self.signed_url_ttl_secs == 0 {
            return Err(MediaError::InvalidConfig(
                "signed_url_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.max_age >= Duration::from_secs(self.signed_url_ttl_secs) {
            return Err(MediaError::InvalidConfig(
                "max_age must be shorter than the signed URL lifetime".to_string(),
            ));
        }

        if self.compression_level > 100 {
            return Err(MediaError::InvalidConfig(
                "compression_level must be between 0 and 100".to_string(),
            ));
        }

        Ok(())
    }
}

impl From<&CoreConfig> for CacheConfig {
    fn from(core: &CoreConfig) -> Self {
        Self {
            max_size_bytes: core.cache_size_bytes(),
            max_age: Duration::from_secs(core.cache_max_age_secs),
            compression_level: core.compression_level,
            signed_url_ttl_secs: core.signed_url_ttl_secs,
            track_last_accessed: core.track_last_accessed,
            ..Self::default()
        }
    }
}

/// Policy for choosing which entry to drop when the cache is over budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Drop the oldest-inserted entry; cache hits do not change priority
    InsertionOrder,

    /// Drop the entry that was least recently resolved
    LeastRecentlyUsed,
}

impl EvictionPolicy {
    /// Returns a human-readable description of the policy.
    pub fn description(&self) -> &'static str {
        match self {
            EvictionPolicy::InsertionOrder => "Remove the oldest cached URLs first",
            EvictionPolicy::LeastRecentlyUsed => {
                "Remove the URLs that have not been requested recently"
            }
        }
    }

    /// Whether a cache hit moves the entry to the back of the eviction queue.
    pub fn promotes_on_hit(&self) -> bool {
        matches!(self, EvictionPolicy::LeastRecentlyUsed)
    }
}
