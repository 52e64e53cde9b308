//! # Progressive Loader
//!
//! Walks one media item up the quality ladder (thumbnail, preview, medium,
//! full) so a viewer can show something immediately and sharpen it as better
//! tiers arrive.
//!
//! [`progressive_stream`] is the primary API: a stream yielding each tier in
//! ascending order that ends after the first failure. [`progressive_load`]
//! drives that stream and hands every delivered tier to a callback.

use crate::cache::MediaCacheManager;
use crate::error::Result;
use crate::tier::QualityTier;
use bridge_traits::MediaId;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// A resolved URL for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierUrl {
    pub tier: QualityTier,
    pub url: String,
}

/// Summary of one progressive run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveOutcome {
    /// Tiers handed to the callback, ascending
    pub delivered: Vec<QualityTier>,

    /// Tier whose resolution stopped the run
    pub failed_tier: Option<QualityTier>,

    pub error: Option<String>,
}

impl ProgressiveOutcome {
    pub fn highest_delivered(&self) -> Option<QualityTier> {
        self.delivered.last().copied()
    }

    /// Returns true if every tier up to full quality was delivered.
    pub fn is_complete(&self) -> bool {
        self.highest_delivered() == Some(QualityTier::Full)
    }
}

struct LadderState<'a> {
    manager: &'a MediaCacheManager,
    media_id: MediaId,
    next: Option<QualityTier>,
    delay: Duration,
    started: bool,
}

/// Stream of ascending tier URLs for `media_id`.
///
/// Each tier is resolved through the cache manager. The configured
/// `tier_upgrade_delay` is awaited between tiers, never after the last one.
/// The first `Err` is yielded and then the stream ends. Dropping the stream
/// cancels the remaining tiers.
pub fn progressive_stream<'a>(
    manager: &'a MediaCacheManager,
    media_id: &MediaId,
) -> BoxStream<'a, Result<TierUrl>> {
    let state = LadderState {
        manager,
        media_id: media_id.clone(),
        next: Some(QualityTier::Thumbnail),
        delay: manager.config().tier_upgrade_delay,
        started: false,
    };

    let stream = stream::unfold(state, |mut state| async move {
        let tier = state.next?;

        if state.started && !state.delay.is_zero() {
            tokio::time::sleep(state.delay).await;
        }
        state.started = true;

        match state.manager.get_url(&state.media_id, tier).await {
            Ok(url) => {
                state.next = tier.next();
                Some((Ok(TierUrl { tier, url }), state))
            }
            Err(e) => {
                state.next = None;
                Some((Err(e), state))
            }
        }
    });

    Box::pin(stream)
}

/// Resolve every tier of `media_id` in order, calling `on_tier_ready` with
/// `(url, tier)` as each arrives.
///
/// A failing tier ends the run; tiers already delivered stay valid. The
/// failure is logged rather than returned and summarized in the outcome.
#[instrument(skip(manager, on_tier_ready), fields(media_id = %media_id))]
pub async fn progressive_load<F>(
    manager: &MediaCacheManager,
    media_id: &MediaId,
    mut on_tier_ready: F,
) -> ProgressiveOutcome
where
    F: FnMut(&str, QualityTier),
{
    let mut outcome = ProgressiveOutcome::default();
    let mut tiers = progressive_stream(manager, media_id);

    while let Some(item) = tiers.next().await {
        match item {
            Ok(TierUrl { tier, url }) => {
                debug!("Delivering {} tier", tier);
                on_tier_ready(&url, tier);
                outcome.delivered.push(tier);
            }
            Err(e) => {
                let failed_tier = match outcome.highest_delivered() {
                    Some(tier) => tier.next(),
                    None => Some(QualityTier::Thumbnail),
                };
                manager
                    .report_failure("progressive_load", media_id, &e.to_string())
                    .await;
                outcome.failed_tier = failed_tier;
                outcome.error = Some(e.to_string());
            }
        }
    }

    outcome
}
