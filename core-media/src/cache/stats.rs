//! Cache statistics and monitoring

use crate::tier::QualityTier;
use serde::{Deserialize, Serialize};

/// Snapshot of the URL cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of live entries (fresh or not yet purged)
    pub total_entries: usize,

    pub thumbnail_entries: usize,
    pub preview_entries: usize,
    pub medium_entries: usize,
    pub full_entries: usize,

    /// Sum of nominal tier sizes across entries
    pub total_bytes: u64,

    /// Entries pointing at encrypted payloads
    pub encrypted_entries: usize,

    /// Lookups answered from the cache
    pub hits: u64,

    /// Lookups that went to the network (including forced refreshes)
    pub misses: u64,

    /// Entries purged because they outlived `max_age`
    pub expirations: u64,

    /// Entries dropped to stay within the size budget
    pub evictions: u64,

    /// Timestamp when stats were calculated
    pub calculated_at: i64,
}

impl CacheStats {
    /// Number of entries held for `tier`.
    pub fn entries_for(&self, tier: QualityTier) -> usize {
        match tier {
            QualityTier::Thumbnail => self.thumbnail_entries,
            QualityTier::Preview => self.preview_entries,
            QualityTier::Medium => self.medium_entries,
            QualityTier::Full => self.full_entries,
        }
    }

    pub(crate) fn record_entry(&mut self, tier: QualityTier, nominal_size: u64, encrypted: bool) {
        self.total_entries += 1;
        self.total_bytes += nominal_size;
        if encrypted {
            self.encrypted_entries += 1;
        }
        match tier {
            QualityTier::Thumbnail => self.thumbnail_entries += 1,
            QualityTier::Preview => self.preview_entries += 1,
            QualityTier::Medium => self.medium_entries += 1,
            QualityTier::Full => self.full_entries += 1,
        }
    }

    /// Calculate cache usage as a percentage of max size.
    pub fn usage_percentage(&self, max_size: u64) -> f64 {
        if max_size == 0 {
            return 0.0;
        }

        (self.total_bytes as f64 / max_size as f64) * 100.0
    }

    /// Returns true if the cache is near capacity (>90%).
    pub fn is_near_capacity(&self, max_size: u64) -> bool {
        self.usage_percentage(max_size) > 90.0
    }

    /// Bytes that would have to be dropped to get back under `max_size`.
    pub fn space_needed(&self, max_size: u64) -> u64 {
        self.total_bytes.saturating_sub(max_size)
    }

    /// Share of lookups served from the cache, in percent.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }

        (self.hits as f64 / lookups as f64) * 100.0
    }
}
