//! # Host Bridge Traits
//!
//! Contracts between the media core and the services the host application
//! provides.
//!
//! ## Overview
//!
//! The core never talks to the backend directly. Every remote capability it
//! needs is expressed as a trait here and injected at construction time, so the
//! same core runs against the production backend, a local emulator, or test
//! fakes.
//!
//! ## Traits
//!
//! ### Media backend
//! - [`MediaMetadataStore`](media::MediaMetadataStore) - Descriptor lookups and last-accessed bookkeeping
//! - [`UrlSigner`](media::UrlSigner) - Time-limited signed URL issuance
//!
//! ### Utilities
//! - [`Clock`](clock::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](log_sink::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert backend-specific errors into it and keep messages actionable
//! (bucket name, table, HTTP status) without leaking credentials.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared behind `Arc` by every task the core spawns.

pub mod clock;
pub mod error;
pub mod log_sink;
pub mod media;

pub use error::BridgeError;

pub use clock::{Clock, ManualClock, SystemClock};
pub use log_sink::{ConsoleLogger, LogEntry, LogLevel, LoggerSink, MemoryLogSink};
pub use media::{Dimensions, MediaDescriptor, MediaId, MediaMetadataStore, UrlSigner};
