//! Media Store Abstractions
//!
//! Contracts for the remote services the media core reads from: the table that
//! holds one descriptor row per media item, and the object-storage bucket that
//! mints time-limited signed URLs for stored paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Opaque identifier of a media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(String);

impl MediaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MediaId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Pixel dimensions of the original upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Authoritative record describing where each quality tier of a media item lives.
///
/// Derived paths (`thumbnail_path`, `preview_path`, `medium_path`) are produced by
/// an out-of-process job after upload and may stay `None` for an arbitrary time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    pub id: MediaId,
    pub original_path: String,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub preview_path: Option<String>,
    #[serde(default)]
    pub medium_path: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Lower-case hex SHA-256 of the plaintext bytes
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub encrypted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_accessed: Option<DateTime<Utc>>,
}

impl MediaDescriptor {
    /// Create a descriptor with only the mandatory fields populated.
    pub fn new(id: impl Into<MediaId>, original_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            original_path: original_path.into(),
            thumbnail_path: None,
            preview_path: None,
            medium_path: None,
            file_size: None,
            dimensions: None,
            mime_type: None,
            checksum: None,
            encrypted: false,
            created_at: Utc::now(),
            last_accessed: None,
        }
    }

    pub fn with_thumbnail_path(mut self, path: impl Into<String>) -> Self {
        self.thumbnail_path = Some(path.into());
        self
    }

    pub fn with_preview_path(mut self, path: impl Into<String>) -> Self {
        self.preview_path = Some(path.into());
        self
    }

    pub fn with_medium_path(mut self, path: impl Into<String>) -> Self {
        self.medium_path = Some(path.into());
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn with_encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Returns true once all three derived tiers have been generated.
    pub fn has_all_derivatives(&self) -> bool {
        self.thumbnail_path.is_some() && self.preview_path.is_some() && self.medium_path.is_some()
    }
}

/// Metadata store trait
///
/// Single-row lookups against the remote media table, keyed by primary id.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::media::{MediaId, MediaMetadataStore};
///
/// async fn exists(store: &dyn MediaMetadataStore, id: &MediaId) -> bool {
///     matches!(store.get_descriptor(id).await, Ok(Some(_)))
/// }
/// ```
#[async_trait]
pub trait MediaMetadataStore: Send + Sync {
    /// Fetch the descriptor for a media item.
    ///
    /// Returns `Ok(None)` when no row exists for `id`.
    async fn get_descriptor(&self, id: &MediaId) -> Result<Option<MediaDescriptor>>;

    /// Persist a new `last_accessed` timestamp.
    ///
    /// Called fire-and-forget by the core; implementations should not retry
    /// aggressively since nobody awaits the outcome.
    async fn touch(&self, id: &MediaId, accessed_at: DateTime<Utc>) -> Result<()>;
}

/// Signed URL issuance trait
///
/// Mints time-limited, authenticated read URLs for objects in the media bucket.
/// The returned URL is treated as an opaque string by the core.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    /// Create a signed URL for `path` that expires after `ttl_secs` seconds.
    async fn sign_url(&self, path: &str, ttl_secs: u64) -> Result<String>;
}
