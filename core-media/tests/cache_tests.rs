//! Integration tests for the media cache manager
//!
//! These tests drive `MediaCacheManager` against recording fakes of the
//! descriptor table and the signing service:
//! - Cache hits never re-hit the network
//! - Expired entries are purged and re-resolved
//! - Size-based eviction keeps the total within budget
//! - Clearing is scoped per media id
//! - Background last-accessed failures only reach the logs, once per sink

mod support;

use bridge_traits::{LoggerSink, ManualClock, MediaId, MemoryLogSink};
use core_media::{CacheConfig, MediaCacheManager, MediaError, QualityTier};
use core_runtime::logging::LoggerSinkLayer;
use core_runtime::CoreConfig;
use std::sync::Arc;
use std::time::Duration;
use support::{
    fully_derived, p1, signed_path, start_time, wait_for_sink_entry, RecordingSigner,
    RecordingStore,
};
use tracing_subscriber::layer::SubscriberExt;

struct Harness {
    manager: MediaCacheManager,
    store: Arc<RecordingStore>,
    signer: Arc<RecordingSigner>,
    clock: Arc<ManualClock>,
    sink: Arc<MemoryLogSink>,
}

fn harness(config: CacheConfig, store: RecordingStore) -> Harness {
    let store = Arc::new(store);
    let signer = Arc::new(RecordingSigner::default());
    let clock = Arc::new(ManualClock::new(start_time()));
    let sink = Arc::new(MemoryLogSink::new());

    let manager = MediaCacheManager::new(config, store.clone(), signer.clone())
        .unwrap()
        .with_clock(clock.clone())
        .with_logger_sink(sink.clone());

    Harness {
        manager,
        store,
        signer,
        clock,
        sink,
    }
}

#[tokio::test]
async fn test_p1_end_to_end() {
    let h = harness(CacheConfig::default(), RecordingStore::with([p1()]));
    let id = MediaId::from("p1");

    let thumb = h.manager.get_url(&id, QualityTier::Thumbnail).await.unwrap();
    assert_eq!(signed_path(&thumb), "u1/b1/x_thumb.jpg");
    assert_eq!(h.signer.calls(), vec![("u1/b1/x_thumb.jpg".to_string(), 3600)]);

    let again = h.manager.get_url(&id, QualityTier::Thumbnail).await.unwrap();
    assert_eq!(again, thumb);
    assert_eq!(h.signer.calls().len(), 1);
    assert_eq!(h.store.lookups(), 1);

    let full = h.manager.get_url(&id, QualityTier::Full).await.unwrap();
    assert_eq!(signed_path(&full), "u1/b1/x.jpg");
    assert_eq!(h.manager.len(), 2);

    h.store.wait_for_touches(3).await;
    assert!(h
        .store
        .touches()
        .iter()
        .all(|(touched, at)| touched == &id && *at == start_time()));

    assert_eq!(h.manager.clear_cache(Some(&id)), 2);
    assert!(h.manager.is_empty());
}

#[tokio::test]
async fn test_repeated_resolves_within_window_are_idempotent() {
    let h = harness(CacheConfig::default(), RecordingStore::with([fully_derived("a")]));
    let id = MediaId::from("a");

    let first = h.manager.get_url(&id, QualityTier::Medium).await.unwrap();
    for _ in 0..5 {
        h.clock.advance(chrono::Duration::minutes(5));
        assert_eq!(h.manager.get_url(&id, QualityTier::Medium).await.unwrap(), first);
    }

    assert_eq!(h.store.lookups(), 1);
    assert_eq!(h.signer.calls().len(), 1);
    let stats = h.manager.stats();
    assert_eq!(stats.hits, 5);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_expired_entry_is_refreshed() {
    let config = CacheConfig::default().with_max_age(Duration::from_secs(60));
    let h = harness(config, RecordingStore::with([p1()]));
    let id = MediaId::from("p1");

    let first = h.manager.get_url(&id, QualityTier::Thumbnail).await.unwrap();
    h.clock.advance(chrono::Duration::seconds(61));
    let second = h.manager.get_url(&id, QualityTier::Thumbnail).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(h.store.lookups(), 2);
    assert_eq!(h.manager.len(), 1);
    assert_eq!(h.manager.stats().expirations, 1);
}

#[tokio::test]
async fn test_failed_refresh_leaves_no_stale_entry() {
    let config = CacheConfig::default().with_max_age(Duration::from_secs(60));
    let h = harness(config, RecordingStore::with([p1()]));
    let id = MediaId::from("p1");

    h.manager.get_url(&id, QualityTier::Thumbnail).await.unwrap();
    h.clock.advance(chrono::Duration::seconds(60));
    h.store.remove("p1");

    let err = h
        .manager
        .get_url(&id, QualityTier::Thumbnail)
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::NotFound(ref missing) if missing == &id));
    assert!(h.manager.cached_entry(&id, QualityTier::Thumbnail).is_none());
    assert_eq!(h.manager.total_bytes(), 0);
}

#[tokio::test]
async fn test_failed_forced_refresh_purges_expired_entry() {
    let config = CacheConfig::default().with_max_age(Duration::from_secs(60));
    let h = harness(config, RecordingStore::with([p1()]));
    let id = MediaId::from("p1");

    h.manager.get_url(&id, QualityTier::Thumbnail).await.unwrap();
    h.clock.advance(chrono::Duration::seconds(120));
    h.store.remove("p1");

    let err = h
        .manager
        .resolve(&id, QualityTier::Thumbnail, true)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(h.manager.cached_entry(&id, QualityTier::Thumbnail).is_none());
    assert_eq!(h.manager.total_bytes(), 0);
    assert!(h.manager.is_empty());
    assert_eq!(h.manager.stats().expirations, 1);
}

#[tokio::test]
async fn test_failed_forced_refresh_keeps_fresh_entry() {
    let h = harness(CacheConfig::default(), RecordingStore::with([p1()]));
    let id = MediaId::from("p1");

    let url = h.manager.get_url(&id, QualityTier::Thumbnail).await.unwrap();
    h.store.remove("p1");

    assert!(h
        .manager
        .resolve(&id, QualityTier::Thumbnail, true)
        .await
        .is_err());
    assert_eq!(
        h.manager.cached_entry(&id, QualityTier::Thumbnail).unwrap().url,
        url
    );
    assert_eq!(h.manager.stats().expirations, 0);
}

#[tokio::test]
async fn test_force_refresh_bypasses_fresh_entry() {
    let h = harness(CacheConfig::default(), RecordingStore::with([p1()]));
    let id = MediaId::from("p1");

    let first = h.manager.resolve(&id, QualityTier::Full, false).await.unwrap();
    let forced = h.manager.resolve(&id, QualityTier::Full, true).await.unwrap();

    assert_ne!(first, forced);
    assert_eq!(
        h.manager.cached_entry(&id, QualityTier::Full).unwrap().url,
        forced
    );
    assert_eq!(h.store.lookups(), 2);
}

#[tokio::test]
async fn test_eviction_drops_oldest_and_respects_budget() {
    let config = CacheConfig::default().with_max_size(20 * 1024);
    let h = harness(
        config,
        RecordingStore::with([fully_derived("a"), fully_derived("b"), fully_derived("c")]),
    );
    let (a, b, c) = (MediaId::from("a"), MediaId::from("b"), MediaId::from("c"));

    h.manager.get_url(&a, QualityTier::Thumbnail).await.unwrap();
    h.clock.advance(chrono::Duration::seconds(1));
    h.manager.get_url(&b, QualityTier::Thumbnail).await.unwrap();
    assert_eq!(h.manager.len(), 2);

    h.clock.advance(chrono::Duration::seconds(1));
    h.manager.get_url(&c, QualityTier::Thumbnail).await.unwrap();

    assert_eq!(h.manager.len(), 2);
    assert!(h.manager.cached_entry(&a, QualityTier::Thumbnail).is_none());
    assert!(h.manager.contains(&b, QualityTier::Thumbnail));
    assert!(h.manager.contains(&c, QualityTier::Thumbnail));
    assert!(h.manager.total_bytes() <= 20 * 1024);
    assert_eq!(h.manager.stats().evictions, 1);
}

#[tokio::test]
async fn test_oversized_entry_is_not_retained() {
    let config = CacheConfig::default().with_max_size(100 * 1024);
    let h = harness(config, RecordingStore::with([p1()]));
    let id = MediaId::from("p1");

    let url = h.manager.get_url(&id, QualityTier::Full).await.unwrap();

    assert_eq!(signed_path(&url), "u1/b1/x.jpg");
    assert!(h.manager.is_empty());
    assert_eq!(h.manager.total_bytes(), 0);
}

#[tokio::test]
async fn test_clear_cache_is_scoped_by_id() {
    let h = harness(
        CacheConfig::default(),
        RecordingStore::with([fully_derived("a"), fully_derived("b")]),
    );
    let (a, b) = (MediaId::from("a"), MediaId::from("b"));

    for tier in QualityTier::ALL {
        h.manager.get_url(&a, tier).await.unwrap();
    }
    h.manager.get_url(&b, QualityTier::Thumbnail).await.unwrap();
    assert_eq!(h.manager.len(), 5);

    assert_eq!(h.manager.clear_cache(Some(&a)), 4);
    for tier in QualityTier::ALL {
        assert!(h.manager.cached_entry(&a, tier).is_none());
    }
    assert!(h.manager.contains(&b, QualityTier::Thumbnail));
    assert_eq!(h.manager.total_bytes(), 10 * 1024);

    assert_eq!(h.manager.clear_cache(Some(&MediaId::from("zzz"))), 0);
    assert_eq!(h.manager.clear_cache(None), 1);
    assert!(h.manager.is_empty());
}

#[tokio::test]
async fn test_not_found_caches_nothing() {
    let h = harness(CacheConfig::default(), RecordingStore::default());
    let id = MediaId::from("ghost");

    let err = h.manager.get_url(&id, QualityTier::Preview).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(!err.is_retryable());
    assert!(h.manager.is_empty());
    assert!(h.signer.calls().is_empty());
    tokio::task::yield_now().await;
    assert!(h.store.touches().is_empty());
}

#[tokio::test]
async fn test_signing_failure_is_retryable_resolution_failure() {
    let h = harness(CacheConfig::default(), RecordingStore::with([p1()]));
    h.signer.fail_paths_containing("_thumb");

    let err = h
        .manager
        .get_url(&MediaId::from("p1"), QualityTier::Thumbnail)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MediaError::ResolutionFailure {
            tier: QualityTier::Thumbnail,
            ..
        }
    ));
    assert!(err.is_retryable());
    assert!(h.manager.is_empty());
}

#[tokio::test]
async fn test_metadata_transport_error_surfaces() {
    let h = harness(CacheConfig::default(), RecordingStore::with([p1()]));
    h.store.make_unreachable("p1");

    let err = h
        .manager
        .get_url(&MediaId::from("p1"), QualityTier::Thumbnail)
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Bridge(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_touch_failure_is_logged_not_returned() {
    let h = harness(CacheConfig::default(), RecordingStore::with([p1()]));
    h.store.fail_touches();

    let url = h
        .manager
        .get_url(&MediaId::from("p1"), QualityTier::Thumbnail)
        .await;
    assert!(url.is_ok());

    wait_for_sink_entry(&h.sink, "touch").await;
    let entry = h
        .sink
        .entries()
        .into_iter()
        .find(|entry| entry.field("operation") == Some("touch"))
        .unwrap();
    assert_eq!(entry.field("media_id"), Some("p1"));
    assert!(entry.field("error").unwrap().contains("row is locked"));
    assert!(!entry.message.contains("token="));
}

#[tokio::test]
async fn test_touch_failure_reaches_shared_sink_once() {
    let h = harness(CacheConfig::default(), RecordingStore::with([p1()]));
    h.store.fail_touches();

    let shared: Arc<dyn LoggerSink> = h.sink.clone();
    let subscriber = tracing_subscriber::registry().with(LoggerSinkLayer::new(Some(shared)));
    let _guard = tracing::subscriber::set_default(subscriber);

    h.manager
        .get_url(&MediaId::from("p1"), QualityTier::Thumbnail)
        .await
        .unwrap();

    wait_for_sink_entry(&h.sink, "touch").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let touch_entries = h
        .sink
        .entries()
        .into_iter()
        .filter(|entry| entry.field("operation") == Some("touch"))
        .count();
    assert_eq!(touch_entries, 1);
}

#[tokio::test]
async fn test_stats_reflect_entries() {
    let h = harness(
        CacheConfig::default(),
        RecordingStore::with([fully_derived("a").with_encrypted(true), p1()]),
    );

    for tier in QualityTier::ALL {
        h.manager.get_url(&MediaId::from("a"), tier).await.unwrap();
    }
    h.manager
        .get_url(&MediaId::from("p1"), QualityTier::Thumbnail)
        .await
        .unwrap();

    let stats = h.manager.stats();
    assert_eq!(stats.total_entries, 5);
    assert_eq!(stats.entries_for(QualityTier::Thumbnail), 2);
    assert_eq!(stats.entries_for(QualityTier::Full), 1);
    assert_eq!(stats.encrypted_entries, 4);
    assert_eq!(stats.total_bytes, (10 + 30 + 200 + 2000 + 10) * 1024);
    assert_eq!(stats.calculated_at, start_time().timestamp());
    assert!(h
        .manager
        .cached_entry(&MediaId::from("a"), QualityTier::Medium)
        .unwrap()
        .encrypted);
}

#[tokio::test]
async fn test_from_core_config_wires_bridges_and_settings() {
    let store = Arc::new(RecordingStore::with([p1()]));
    let signer = Arc::new(RecordingSigner::default());
    let clock = Arc::new(ManualClock::new(start_time()));

    let core = CoreConfig::builder()
        .metadata_store(store.clone())
        .url_signer(signer.clone())
        .clock(clock.clone())
        .cache_size_mb(1)
        .cache_max_age_secs(60)
        .signed_url_ttl_secs(120)
        .build()
        .unwrap();

    let manager = MediaCacheManager::from_core_config(&core).unwrap();
    assert_eq!(manager.config().max_size_bytes, 1024 * 1024);
    assert_eq!(manager.config().max_age, Duration::from_secs(60));

    let id = MediaId::from("p1");
    manager.get_url(&id, QualityTier::Thumbnail).await.unwrap();
    assert_eq!(signer.calls(), vec![("u1/b1/x_thumb.jpg".to_string(), 120)]);

    clock.advance(chrono::Duration::seconds(60));
    assert!(!manager.contains(&id, QualityTier::Thumbnail));
}
