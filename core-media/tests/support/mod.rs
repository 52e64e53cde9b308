//! Recording fakes for the remote media collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{MediaDescriptor, MediaId, MediaMetadataStore, MemoryLogSink, UrlSigner};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

/// Descriptor with a thumbnail derivative only, like a fresh upload.
pub fn p1() -> MediaDescriptor {
    MediaDescriptor::new("p1", "u1/b1/x.jpg").with_thumbnail_path("u1/b1/x_thumb.jpg")
}

/// Descriptor with every derivative generated.
pub fn fully_derived(id: &str) -> MediaDescriptor {
    MediaDescriptor::new(id, format!("u1/b1/{}.jpg", id))
        .with_thumbnail_path(format!("u1/b1/{}_thumb.jpg", id))
        .with_preview_path(format!("u1/b1/{}_preview.jpg", id))
        .with_medium_path(format!("u1/b1/{}_medium.jpg", id))
}

/// In-memory descriptor table that records every call.
#[derive(Default)]
pub struct RecordingStore {
    descriptors: Mutex<HashMap<MediaId, MediaDescriptor>>,
    unreachable: Mutex<HashSet<MediaId>>,
    touches: Mutex<Vec<(MediaId, DateTime<Utc>)>>,
    lookups: AtomicUsize,
    fail_touch: AtomicBool,
}

impl RecordingStore {
    pub fn with(descriptors: impl IntoIterator<Item = MediaDescriptor>) -> Self {
        let store = Self::default();
        for descriptor in descriptors {
            store.insert(descriptor);
        }
        store
    }

    pub fn insert(&self, descriptor: MediaDescriptor) {
        self.descriptors
            .lock()
            .insert(descriptor.id.clone(), descriptor);
    }

    pub fn remove(&self, id: &str) {
        self.descriptors.lock().remove(&MediaId::from(id));
    }

    /// Lookups for `id` fail with a transport error.
    pub fn make_unreachable(&self, id: &str) {
        self.unreachable.lock().insert(MediaId::from(id));
    }

    pub fn fail_touches(&self) {
        self.fail_touch.store(true, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn touches(&self) -> Vec<(MediaId, DateTime<Utc>)> {
        self.touches.lock().clone()
    }

    /// Wait until at least `count` touch attempts were made.
    pub async fn wait_for_touches(&self, count: usize) {
        let reached = tokio::time::timeout(Duration::from_secs(2), async {
            while self.touches.lock().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(reached.is_ok(), "expected {} touches", count);
    }
}

#[async_trait]
impl MediaMetadataStore for RecordingStore {
    async fn get_descriptor(&self, id: &MediaId) -> BridgeResult<Option<MediaDescriptor>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.unreachable.lock().contains(id) {
            return Err(BridgeError::DatabaseError("connection reset".into()));
        }

        Ok(self.descriptors.lock().get(id).cloned())
    }

    async fn touch(&self, id: &MediaId, accessed_at: DateTime<Utc>) -> BridgeResult<()> {
        self.touches.lock().push((id.clone(), accessed_at));

        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(BridgeError::DatabaseError("row is locked".into()));
        }
        Ok(())
    }
}

/// Signer returning a distinct URL per call, so re-signing is observable.
#[derive(Default)]
pub struct RecordingSigner {
    calls: Mutex<Vec<(String, u64)>>,
    failing_fragments: Mutex<Vec<String>>,
    counter: AtomicUsize,
}

impl RecordingSigner {
    /// Signing fails for every path containing `fragment`.
    pub fn fail_paths_containing(&self, fragment: &str) {
        self.failing_fragments.lock().push(fragment.to_string());
    }

    pub fn calls(&self) -> Vec<(String, u64)> {
        self.calls.lock().clone()
    }

    pub fn signed_paths(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(path, _)| path.clone()).collect()
    }
}

#[async_trait]
impl UrlSigner for RecordingSigner {
    async fn sign_url(&self, path: &str, ttl_secs: u64) -> BridgeResult<String> {
        self.calls.lock().push((path.to_string(), ttl_secs));

        if self
            .failing_fragments
            .lock()
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
        {
            return Err(BridgeError::StorageError(format!("cannot sign {}", path)));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://storage.test/{}?token=sig-{}", path, n))
    }
}

/// Path portion of a URL minted by [`RecordingSigner`].
pub fn signed_path(url: &str) -> &str {
    let without_host = url.trim_start_matches("https://storage.test/");
    without_host.split('?').next().unwrap_or(without_host)
}

/// Wait until the sink holds at least one entry for `operation`.
pub async fn wait_for_sink_entry(sink: &MemoryLogSink, operation: &str) {
    let found = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if sink
                .entries()
                .iter()
                .any(|entry| entry.field("operation") == Some(operation))
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(found.is_ok(), "no sink entry for {}", operation);
}
