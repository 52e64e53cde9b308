//! # URL Cache Module
//!
//! Client-side cache of signed media URLs keyed by (media id, quality tier),
//! plus the payload encryption used for sensitive items.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │     MediaCacheManager                  │
//! │  - resolve() / get_url()               │
//! │  - clear_cache()                       │
//! │  - stats()                             │
//! └────────┬───────────────────────────────┘
//!          │
//!          ├──> MediaMetadataStore (descriptors, last-accessed)
//!          ├──> UrlResolver ──> UrlSigner (signed URLs)
//!          └──> Clock (freshness)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_media::cache::{CacheConfig, MediaCacheManager};
//! use core_media::QualityTier;
//!
//! # async fn example(manager: &MediaCacheManager) -> core_media::Result<()> {
//! let url = manager.get_url(&"p1".into(), QualityTier::Thumbnail).await?;
//!
//! // Second call inside the freshness window is served from memory
//! let again = manager.get_url(&"p1".into(), QualityTier::Thumbnail).await?;
//! assert_eq!(url, again);
//!
//! let stats = manager.stats();
//! println!("Cache usage: {:.1}%", stats.usage_percentage(manager.config().max_size_bytes));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod encryption;
pub mod entry;
pub mod manager;
pub mod stats;

pub use config::{CacheConfig, EvictionPolicy};
pub use encryption::{
    content_checksum, decrypt, encrypt, verify_checksum, EncryptedPayload, EncryptionKey,
    MediaEncryptor,
};
pub use entry::{CacheEntry, CacheKey};
pub use manager::MediaCacheManager;
pub use stats::CacheStats;
