//! # Preloader
//!
//! Best-effort cache warm-up for a batch of media items, typically the
//! thumbnails of a grid about to scroll into view.

use crate::cache::MediaCacheManager;
use crate::tier::QualityTier;
use bridge_traits::MediaId;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// What a preload batch achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadReport {
    /// Distinct ids attempted
    pub requested: usize,

    pub succeeded: usize,

    /// Ids that could not be resolved, with the reason
    pub failed: Vec<(MediaId, String)>,
}

impl PreloadReport {
    /// Returns true if every attempted id is now cached.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Resolve `tier` for every id concurrently.
///
/// Duplicate ids are attempted once. Individual failures are logged and
/// collected; they never abort the batch. Returns once every attempt settled.
#[instrument(skip(manager, media_ids), fields(count = media_ids.len()))]
pub async fn preload_media(
    manager: &MediaCacheManager,
    media_ids: &[MediaId],
    tier: QualityTier,
) -> PreloadReport {
    let mut seen = HashSet::new();
    let unique: Vec<&MediaId> = media_ids.iter().filter(|id| seen.insert(*id)).collect();

    let attempts = unique.iter().map(|id| async move {
        let result = manager.get_url(id, tier).await;
        (*id, result)
    });
    let results = join_all(attempts).await;

    let mut report = PreloadReport {
        requested: unique.len(),
        ..Default::default()
    };

    for (id, result) in results {
        match result {
            Ok(_) => report.succeeded += 1,
            Err(e) => {
                let reason = e.to_string();
                manager.report_failure("preload", id, &reason).await;
                report.failed.push((id.clone(), reason));
            }
        }
    }

    debug!(
        "Preloaded {}/{} {} URLs",
        report.succeeded, report.requested, tier
    );
    report
}

/// Warm the thumbnail tier for a batch of ids.
pub async fn preload_thumbnails(
    manager: &MediaCacheManager,
    media_ids: &[MediaId],
) -> PreloadReport {
    preload_media(manager, media_ids, QualityTier::Thumbnail).await
}
