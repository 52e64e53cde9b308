//! # Core Configuration Module
//!
//! Configuration and bridge wiring for the media core.
//!
//! ## Overview
//!
//! `CoreConfig` holds the host-provided bridges plus the process-wide cache
//! settings. It is built through [`CoreConfigBuilder`], which fails fast with an
//! actionable message when a required bridge is missing or a setting is out of
//! range, before any service is constructed.
//!
//! ## Required Dependencies
//!
//! - `MediaMetadataStore` - Descriptor lookups against the media table
//! - `UrlSigner` - Signed URL issuance for the media bucket
//!
//! ## Optional Dependencies
//!
//! - `Clock` - Defaults to [`SystemClock`]
//! - `LoggerSink` - Receives failures of fire-and-forget work
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .metadata_store(Arc::new(MyMediaTable::new(client.clone())))
//!     .url_signer(Arc::new(MyBucketSigner::new(client)))
//!     .cache_size_mb(50)
//!     .cache_max_age_secs(30 * 60)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, LoggerSink, MediaMetadataStore, SystemClock, UrlSigner};
use std::sync::Arc;

/// Default aggregate nominal cache budget.
pub const DEFAULT_CACHE_SIZE_MB: u64 = 50;

/// Default lifetime of a cached URL; kept below the signature lifetime.
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 30 * 60;

/// Lifetime requested for each signed URL.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Advisory quality handed to the derivative generation job.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 80;

const MAX_CACHE_SIZE_MB: u64 = 10_000;

/// Core configuration for the media core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Descriptor lookups (required)
    pub metadata_store: Arc<dyn MediaMetadataStore>,

    /// Signed URL issuance (required)
    pub url_signer: Arc<dyn UrlSigner>,

    /// Time source used for cache freshness
    pub clock: Arc<dyn Clock>,

    /// Host sink for background failures (optional)
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    /// Aggregate nominal cache budget in megabytes
    pub cache_size_mb: u64,

    /// Cached URL lifetime in seconds
    pub cache_max_age_secs: u64,

    /// Signed URL lifetime in seconds
    pub signed_url_ttl_secs: u64,

    /// Advisory compression level (0-100) for derivative generation
    pub compression_level: u8,

    /// Persist `last_accessed` on every successful resolve
    pub track_last_accessed: bool,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("metadata_store", &"MediaMetadataStore { ... }")
            .field("url_signer", &"UrlSigner { ... }")
            .field("clock", &"Clock { ... }")
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("cache_size_mb", &self.cache_size_mb)
            .field("cache_max_age_secs", &self.cache_max_age_secs)
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .field("compression_level", &self.compression_level)
            .field("track_last_accessed", &self.track_last_accessed)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Cache budget converted to bytes.
    pub fn cache_size_bytes(&self) -> u64 {
        self.cache_size_mb * 1024 * 1024
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Cache size is reasonable (> 0 and <= 10GB)
    /// - Cache max age is non-zero and shorter than the signed URL lifetime,
    ///   so a cached URL never outlives its signature
    /// - Compression level is a percentage
    pub fn validate(&self) -> Result<()> {
        if self.cache_size_mb == 0 {
            return Err(Error::Config(
                "Cache size must be greater than 0 MB".to_string(),
            ));
        }

        if self.cache_size_mb > MAX_CACHE_SIZE_MB {
            return Err(Error::Config(format!(
                "Cache size exceeds maximum of {} MB",
                MAX_CACHE_SIZE_MB
            )));
        }

        if self.signed_url_ttl_secs == 0 {
            return Err(Error::Config(
                "Signed URL TTL must be greater than 0 seconds".to_string(),
            ));
        }

        if self.cache_max_age_secs == 0 {
            return Err(Error::Config(
                "Cache max age must be greater than 0 seconds".to_string(),
            ));
        }

        if self.cache_max_age_secs >= self.signed_url_ttl_secs {
            return Err(Error::Config(format!(
                "Cache max age ({}s) must be shorter than the signed URL TTL ({}s); \
                 cached URLs would otherwise outlive their signature",
                self.cache_max_age_secs, self.signed_url_ttl_secs
            )));
        }

        if self.compression_level > 100 {
            return Err(Error::Config(format!(
                "Compression level must be between 0 and 100, got {}",
                self.compression_level
            )));
        }

        Ok(())
    }
}

fn metadata_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaMetadataStore".to_string(),
        message: "A MediaMetadataStore implementation is required to look up media descriptors. \
                 Inject the adapter for the backend media table via .metadata_store()."
            .to_string(),
    }
}

fn url_signer_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "UrlSigner".to_string(),
        message: "A UrlSigner implementation is required to mint signed media URLs. \
                 Inject the adapter for the storage bucket via .url_signer()."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    metadata_store: Option<Arc<dyn MediaMetadataStore>>,
    url_signer: Option<Arc<dyn UrlSigner>>,
    clock: Option<Arc<dyn Clock>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    cache_size_mb: Option<u64>,
    cache_max_age_secs: Option<u64>,
    signed_url_ttl_secs: Option<u64>,
    compression_level: Option<u8>,
    track_last_accessed: Option<bool>,
}

impl CoreConfigBuilder {
    /// Sets the metadata store adapter (required).
    pub fn metadata_store(mut self, store: Arc<dyn MediaMetadataStore>) -> Self {
        self.metadata_store = Some(store);
        self
    }

    /// Sets the signed URL issuer (required).
    pub fn url_signer(mut self, signer: Arc<dyn UrlSigner>) -> Self {
        self.url_signer = Some(signer);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Sets the aggregate nominal cache budget in megabytes (default 50).
    pub fn cache_size_mb(mut self, size_mb: u64) -> Self {
        self.cache_size_mb = Some(size_mb);
        self
    }

    /// Sets how long a resolved URL stays cached (default 30 minutes).
    pub fn cache_max_age_secs(mut self, secs: u64) -> Self {
        self.cache_max_age_secs = Some(secs);
        self
    }

    /// Sets the signed URL lifetime (default 3600 seconds).
    pub fn signed_url_ttl_secs(mut self, secs: u64) -> Self {
        self.signed_url_ttl_secs = Some(secs);
        self
    }

    pub fn compression_level(mut self, level: u8) -> Self {
        self.compression_level = Some(level);
        self
    }

    pub fn track_last_accessed(mut self, enabled: bool) -> Self {
        self.track_last_accessed = Some(enabled);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns an error if a required bridge is missing or a setting is out of
    /// range.
    pub fn build(self) -> Result<CoreConfig> {
        let metadata_store = self
            .metadata_store
            .ok_or_else(metadata_store_missing_error)?;
        let url_signer = self.url_signer.ok_or_else(url_signer_missing_error)?;

        let config = CoreConfig {
            metadata_store,
            url_signer,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            logger_sink: self.logger_sink,
            cache_size_mb: self.cache_size_mb.unwrap_or(DEFAULT_CACHE_SIZE_MB),
            cache_max_age_secs: self
                .cache_max_age_secs
                .unwrap_or(DEFAULT_CACHE_MAX_AGE_SECS),
            signed_url_ttl_secs: self
                .signed_url_ttl_secs
                .unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS),
            compression_level: self.compression_level.unwrap_or(DEFAULT_COMPRESSION_LEVEL),
            track_last_accessed: self.track_last_accessed.unwrap_or(true),
        };

        config.validate()?;

        Ok(config)
    }
}
