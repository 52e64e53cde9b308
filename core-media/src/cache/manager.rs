//! # Media Cache Manager
//!
//! Keeps resolved signed URLs per (media id, tier) so repeated requests inside
//! the freshness window never touch the network.
//!
//! - Entries expire after `max_age` and are purged on the next lookup
//! - Aggregate nominal size is kept within `max_size_bytes` by evicting the
//!   oldest entries first (or least recently used, if configured)
//! - Every successful resolve records a fire-and-forget `last_accessed` update
//!
//! Concurrent misses for the same key are not deduplicated: both resolve, the
//! last writer wins and both callers receive valid URLs.

use crate::cache::{
    config::CacheConfig,
    entry::{CacheEntry, CacheKey},
    stats::CacheStats,
};
use crate::error::{MediaError, Result};
use crate::resolver::UrlResolver;
use crate::tier::QualityTier;
use bridge_traits::{
    Clock, LogEntry, LogLevel, LoggerSink, MediaId, MediaMetadataStore, SystemClock, UrlSigner,
};
use core_runtime::config::CoreConfig;
use lru::LruCache;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, instrument, warn};

struct CacheState {
    entries: LruCache<CacheKey, CacheEntry>,
    total_bytes: u64,
    hits: u64,
    misses: u64,
    expirations: u64,
    evictions: u64,
}

impl CacheState {
    fn new() -> Self {
        Self {
            entries: LruCache::unbounded(),
            total_bytes: 0,
            hits: 0,
            misses: 0,
            expirations: 0,
            evictions: 0,
        }
    }

    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.pop(key)?;
        self.total_bytes = self.total_bytes.saturating_sub(entry.nominal_size);
        Some(entry)
    }
}

/// Size- and age-bounded cache of signed media URLs.
///
/// The map lock is only taken in synchronous sections and is never held across
/// an `.await`.
pub struct MediaCacheManager {
    config: CacheConfig,
    store: Arc<dyn MediaMetadataStore>,
    resolver: UrlResolver,
    clock: Arc<dyn Clock>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    state: Mutex<CacheState>,
}

impl MediaCacheManager {
    /// Create a new cache manager.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use core_media::{CacheConfig, MediaCacheManager, QualityTier};
    ///
    /// let manager = MediaCacheManager::new(CacheConfig::default(), store, signer)?;
    /// let url = manager.get_url(&"p1".into(), QualityTier::Thumbnail).await?;
    /// ```
    pub fn new(
        config: CacheConfig,
        store: Arc<dyn MediaMetadataStore>,
        signer: Arc<dyn UrlSigner>,
    ) -> Result<Self> {
        config.validate()?;

        let resolver = UrlResolver::new(signer).with_ttl(config.signed_url_ttl_secs);

        Ok(Self {
            config,
            store,
            resolver,
            clock: Arc::new(SystemClock),
            logger_sink: None,
            state: Mutex::new(CacheState::new()),
        })
    }

    /// Build a manager from the service-wide configuration and its bridges.
    pub fn from_core_config(core: &CoreConfig) -> Result<Self> {
        core.validate()?;

        let mut manager = Self::new(
            CacheConfig::from(core),
            Arc::clone(&core.metadata_store),
            Arc::clone(&core.url_signer),
        )?
        .with_clock(Arc::clone(&core.clock));

        if let Some(sink) = &core.logger_sink {
            manager = manager.with_logger_sink(Arc::clone(sink));
        }

        Ok(manager)
    }

    /// Replace the time source used for freshness checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Report background failures to the host's log pipeline as well.
    ///
    /// The same sink may also back a `LoggerSinkLayer`; the layer skips the
    /// events already delivered here.
    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Resolve a URL for `tier` of `media_id`, answering from the cache when a
    /// fresh entry exists and `force_refresh` is false.
    #[instrument(skip(self), fields(media_id = %media_id))]
    pub async fn resolve(
        &self,
        media_id: &MediaId,
        tier: QualityTier,
        force_refresh: bool,
    ) -> Result<String> {
        let key = CacheKey::new(media_id.clone(), tier);

        if force_refresh {
            self.purge_if_expired(&key);
        } else if let Some(url) = self.lookup_fresh(&key) {
            debug!("Cache hit for {}", key);
            self.spawn_touch(media_id);
            return Ok(url);
        }

        debug!("Cache miss for {}, fetching descriptor", key);

        let descriptor = self
            .store
            .get_descriptor(media_id)
            .await
            .map_err(|e| {
                warn!("Descriptor lookup for {} failed: {}", media_id, e);
                MediaError::from(e)
            })?
            .ok_or_else(|| MediaError::NotFound(media_id.clone()))?;

        let url = self.resolver.resolve_url(&descriptor, tier).await?;

        let entry = CacheEntry::new(url.clone(), tier, self.clock.now(), descriptor.encrypted);
        self.insert(key, entry);
        self.spawn_touch(media_id);

        Ok(url)
    }

    /// Same as [`resolve`](Self::resolve) without forcing a refresh.
    pub async fn get_url(&self, media_id: &MediaId, tier: QualityTier) -> Result<String> {
        self.resolve(media_id, tier, false).await
    }

    /// Drop every tier of `media_id`, or everything when `None`.
    ///
    /// Resolves already in flight are not blocked and may repopulate the
    /// cache afterwards. Returns the number of entries removed.
    #[instrument(skip(self))]
    pub fn clear_cache(&self, media_id: Option<&MediaId>) -> usize {
        let mut state = self.state.lock();

        let removed = match media_id {
            None => {
                let count = state.entries.len();
                state.entries.clear();
                state.total_bytes = 0;
                count
            }
            Some(id) => {
                let keys: Vec<CacheKey> = state
                    .entries
                    .iter()
                    .filter(|(key, _)| &key.media_id == id)
                    .map(|(key, _)| key.clone())
                    .collect();

                keys.into_iter().filter_map(|key| state.remove(&key)).count()
            }
        };

        info!("Cleared {} cached URL(s)", removed);
        removed
    }

    /// Purge every entry that has outlived `max_age`. Returns how many went.
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let stale: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh(now, self.config.max_age))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            state.remove(key);
        }
        state.expirations += stale.len() as u64;

        if !stale.is_empty() {
            debug!("Pruned {} expired entries", stale.len());
        }
        stale.len()
    }

    /// Snapshot of the cache contents and counters.
    pub fn stats(&self) -> CacheStats {
        let calculated_at = self.clock.unix_timestamp();
        let state = self.state.lock();

        let mut stats = CacheStats {
            hits: state.hits,
            misses: state.misses,
            expirations: state.expirations,
            evictions: state.evictions,
            calculated_at,
            ..Default::default()
        };

        for (_, entry) in state.entries.iter() {
            stats.record_entry(entry.tier, entry.nominal_size, entry.encrypted);
        }

        stats
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate nominal size of all entries.
    pub fn total_bytes(&self) -> u64 {
        self.state.lock().total_bytes
    }

    /// Whether a fresh entry exists. Does not count as a lookup.
    pub fn contains(&self, media_id: &MediaId, tier: QualityTier) -> bool {
        let now = self.clock.now();
        let key = CacheKey::new(media_id.clone(), tier);
        self.state
            .lock()
            .entries
            .peek(&key)
            .is_some_and(|entry| entry.is_fresh(now, self.config.max_age))
    }

    /// The stored entry for a key, fresh or not.
    pub fn cached_entry(&self, media_id: &MediaId, tier: QualityTier) -> Option<CacheEntry> {
        let key = CacheKey::new(media_id.clone(), tier);
        self.state.lock().entries.peek(&key).cloned()
    }

    /// Log a failure of work nobody awaits to tracing and the host sink.
    pub(crate) async fn report_failure(&self, operation: &str, media_id: &MediaId, reason: &str) {
        report_background_failure(self.logger_sink.as_deref(), operation, media_id, reason).await;
    }

    fn lookup_fresh(&self, key: &CacheKey) -> Option<String> {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let fresh = state
            .entries
            .peek(key)
            .map(|entry| entry.is_fresh(now, self.config.max_age));

        match fresh {
            Some(true) => {
                let entry = if self.config.eviction_policy.promotes_on_hit() {
                    state.entries.get(key)
                } else {
                    state.entries.peek(key)
                };
                let url = entry.map(|entry| entry.url.clone());
                state.hits += 1;
                url
            }
            Some(false) => {
                state.remove(key);
                state.expirations += 1;
                state.misses += 1;
                debug!("Purged expired entry {}", key);
                None
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Forced refreshes skip the hit path but still drop an expired entry, so a
    /// failed refetch leaves nothing behind. A fresh entry stays until replaced.
    fn purge_if_expired(&self, key: &CacheKey) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.misses += 1;

        let expired = state
            .entries
            .peek(key)
            .is_some_and(|entry| !entry.is_fresh(now, self.config.max_age));

        if expired {
            state.remove(key);
            state.expirations += 1;
            debug!("Purged expired entry {} before forced refresh", key);
        }
    }

    fn insert(&self, key: CacheKey, entry: CacheEntry) {
        let max_size = self.config.max_size_bytes;
        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.remove(&key);
        state.total_bytes += entry.nominal_size;
        state.entries.put(key, entry);

        while state.total_bytes > max_size {
            let Some((evicted_key, evicted)) = state.entries.pop_lru() else {
                break;
            };
            state.total_bytes = state.total_bytes.saturating_sub(evicted.nominal_size);
            state.evictions += 1;
            debug!(
                "Evicted {} ({} bytes) to stay within {} bytes",
                evicted_key, evicted.nominal_size, max_size
            );
        }
    }

    fn spawn_touch(&self, media_id: &MediaId) {
        if !self.config.track_last_accessed {
            return;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                debug!("No async runtime, skipping last-accessed update for {}", media_id);
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let sink = self.logger_sink.clone();
        let media_id = media_id.clone();
        let accessed_at = self.clock.now();

        handle.spawn(async move {
            if let Err(e) = store.touch(&media_id, accessed_at).await {
                report_background_failure(sink.as_deref(), "touch", &media_id, &e.to_string())
                    .await;
            }
        });
    }
}

/// Warn about a failure nobody awaits and hand it to the manager's sink.
///
/// The `warn!` is flagged as sink-delivered when the sink takes the entry, so
/// a `LoggerSinkLayer` sharing that sink does not record it a second time.
async fn report_background_failure(
    sink: Option<&dyn LoggerSink>,
    operation: &str,
    media_id: &MediaId,
    reason: &str,
) {
    let sink = sink.filter(|sink| LogLevel::Warn >= sink.min_level());

    warn!(
        operation,
        media_id = %media_id,
        sink_delivered = sink.is_some(),
        "Background {} failed: {}",
        operation,
        reason
    );

    let Some(sink) = sink else {
        return;
    };

    let entry = LogEntry::new(
        LogLevel::Warn,
        "core_media",
        format!("Background {} failed", operation),
    )
    .with_field("operation", operation)
    .with_field("media_id", media_id.as_str())
    .with_field("error", reason);

    if let Err(e) = sink.log(entry).await {
        debug!("Logger sink rejected entry: {}", e);
    }
}
