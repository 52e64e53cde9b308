//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-media`, `core-runtime`). Host applications can
//! depend on `media-delivery-workspace` and enable the documented features
//! without needing to wire each crate individually.
//!
//! - `media`: the tiered URL cache, progressive loader and preloader
//! - `encryption`: AES-256-GCM sealing of cached payloads

#[cfg(feature = "media")]
pub use core_media as media;

#[cfg(feature = "media")]
pub use core_runtime as runtime;
