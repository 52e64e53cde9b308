//! # Media Delivery Core
//!
//! Serves images at the quality tier that fits the moment (grid thumbnail,
//! list preview, full-screen viewer) while keeping bandwidth low.
//!
//! ## Overview
//!
//! This crate handles:
//! - Resolving signed URLs per tier with fallback to the original upload
//! - A size- and age-bounded cache of resolved URLs
//! - Progressive quality upgrades for a single item
//! - Best-effort batch preloading
//! - AES-256-GCM encryption of sensitive payloads (feature `encryption`)
//!
//! Remote collaborators (the descriptor table and the signing service) are
//! injected through the traits in `bridge-traits`.

pub mod cache;
pub mod error;
pub mod preload;
pub mod progressive;
pub mod resolver;
pub mod tier;

pub use cache::{
    CacheConfig, CacheEntry, CacheKey, CacheStats, EncryptedPayload, EncryptionKey,
    EvictionPolicy, MediaCacheManager, MediaEncryptor,
};
pub use error::{MediaError, Result};
pub use preload::{preload_media, preload_thumbnails, PreloadReport};
pub use progressive::{progressive_load, progressive_stream, ProgressiveOutcome, TierUrl};
pub use resolver::UrlResolver;
pub use tier::QualityTier;

pub use bridge_traits::{MediaDescriptor, MediaId};
