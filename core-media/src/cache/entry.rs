//! Cache keys and entries.

use crate::tier::QualityTier;
use bridge_traits::MediaId;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Composite cache key: one entry per (media item, tier).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub media_id: MediaId,
    pub tier: QualityTier,
}

impl CacheKey {
    pub fn new(media_id: MediaId, tier: QualityTier) -> Self {
        Self { media_id, tier }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.media_id, self.tier)
    }
}

/// A resolved URL held by the cache manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub url: String,
    pub tier: QualityTier,
    /// When the URL was resolved; freshness and eviction order derive from it
    pub created_at: DateTime<Utc>,
    /// Fixed per-tier estimate, see [`QualityTier::nominal_size_bytes`]
    pub nominal_size: u64,
    /// Bytes behind the URL must be decrypted before use
    pub encrypted: bool,
}

impl CacheEntry {
    pub fn new(url: String, tier: QualityTier, created_at: DateTime<Utc>, encrypted: bool) -> Self {
        Self {
            url,
            tier,
            created_at,
            nominal_size: tier.nominal_size_bytes(),
            encrypted,
        }
    }

    /// An entry is fresh while `now - created_at < max_age`.
    ///
    /// A `created_at` in the future (clock moved backwards) counts as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match (now - self.created_at).to_std() {
            Ok(age) => age < max_age,
            Err(_) => true,
        }
    }
}
