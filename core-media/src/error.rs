//! # Media Error Types
//!
//! Error kinds surfaced by the media delivery core.

use crate::tier::QualityTier;
use bridge_traits::{BridgeError, MediaId};
use thiserror::Error;

/// Errors that can occur while resolving, caching or decrypting media.
#[derive(Error, Debug)]
pub enum MediaError {
    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// No descriptor exists for the requested media id.
    #[error("Media not found: {0}")]
    NotFound(MediaId),

    /// No usable path for the tier, or signed URL minting failed.
    #[error("Failed to resolve {tier} for media {media_id}: {reason}")]
    ResolutionFailure {
        media_id: MediaId,
        tier: QualityTier,
        reason: String,
    },

    // ========================================================================
    // Payload Errors
    // ========================================================================
    /// Authenticated decryption or checksum verification failed.
    #[error("Integrity check failed: {0}")]
    IntegrityFailure(String),

    /// Key or payload format problem unrelated to tampering.
    #[error("Encryption error: {0}")]
    EncryptionError(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown quality tier: {0}")]
    InvalidTier(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// Transport failure talking to the metadata store.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl MediaError {
    pub(crate) fn resolution(
        media_id: &MediaId,
        tier: QualityTier,
        reason: impl Into<String>,
    ) -> Self {
        MediaError::ResolutionFailure {
            media_id: media_id.clone(),
            tier,
            reason: reason.into(),
        }
    }

    /// Returns `true` if retrying (e.g. with `force_refresh`) may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MediaError::ResolutionFailure { .. } | MediaError::Bridge(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MediaError::NotFound(_))
    }

    /// Returns `true` if cached bytes should be treated as unusable and purged.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, MediaError::IntegrityFailure(_))
    }
}

/// Result type for media operations.
pub type Result<T> = std::result::Result<T, MediaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let not_found = MediaError::NotFound(MediaId::from("missing"));
        assert!(not_found.is_not_found());
        assert!(!not_found.is_retryable());

        let resolution =
            MediaError::resolution(&MediaId::from("p1"), QualityTier::Medium, "signing failed");
        assert!(resolution.is_retryable());
        assert_eq!(
            resolution.to_string(),
            "Failed to resolve medium for media p1: signing failed"
        );

        let integrity = MediaError::IntegrityFailure("tag mismatch".into());
        assert!(integrity.is_integrity_failure());
        assert!(!integrity.is_retryable());

        let bridge: MediaError = BridgeError::DatabaseError("connection reset".into()).into();
        assert!(bridge.is_retryable());
    }
}
