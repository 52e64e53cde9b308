//! # URL Resolver
//!
//! Maps a descriptor and a requested tier to a stored path and asks the
//! storage bridge for a signed URL.
//!
//! Derived tiers fall back to the original upload when their path is missing.
//! The generation job runs asynchronously after upload, so a freshly uploaded
//! item is served heavier than ideal rather than not at all.

use crate::error::{MediaError, Result};
use crate::tier::QualityTier;
use bridge_traits::{MediaDescriptor, UrlSigner};
use core_runtime::config::DEFAULT_SIGNED_URL_TTL_SECS;
use core_runtime::logging::{redact_signed_url, strip_path};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Resolves descriptor tiers to signed URLs.
#[derive(Clone)]
pub struct UrlResolver {
    signer: Arc<dyn UrlSigner>,
    ttl_secs: u64,
}

impl UrlResolver {
    pub fn new(signer: Arc<dyn UrlSigner>) -> Self {
        Self {
            signer,
            ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
        }
    }

    /// Override the signed URL lifetime.
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Storage path serving `tier`, falling back to the original for derived
    /// tiers. Empty strings count as absent.
    pub fn path_for_tier(descriptor: &MediaDescriptor, tier: QualityTier) -> Option<&str> {
        let derived = match tier {
            QualityTier::Thumbnail => descriptor.thumbnail_path.as_deref(),
            QualityTier::Preview => descriptor.preview_path.as_deref(),
            QualityTier::Medium => descriptor.medium_path.as_deref(),
            QualityTier::Full => None,
        };

        derived
            .filter(|path| !path.is_empty())
            .or_else(|| Some(descriptor.original_path.as_str()).filter(|path| !path.is_empty()))
    }

    /// Resolve a signed URL for `tier` of the described item.
    #[instrument(skip(self, descriptor), fields(media_id = %descriptor.id))]
    pub async fn resolve_url(
        &self,
        descriptor: &MediaDescriptor,
        tier: QualityTier,
    ) -> Result<String> {
        let path = Self::path_for_tier(descriptor, tier).ok_or_else(|| {
            MediaError::resolution(&descriptor.id, tier, "descriptor has no usable storage path")
        })?;

        if tier != QualityTier::Full && path == descriptor.original_path {
            debug!(
                "No {} derivative yet, serving original {}",
                tier,
                strip_path(path)
            );
        }

        let url = self
            .signer
            .sign_url(path, self.ttl_secs)
            .await
            .map_err(|e| {
                warn!("Signing {} failed: {}", strip_path(path), e);
                MediaError::resolution(&descriptor.id, tier, format!("signing failed: {}", e))
            })?;

        debug!(url = %redact_signed_url(&url), "Signed {} URL", tier);
        Ok(url)
    }
}
