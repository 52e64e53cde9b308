//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the media core:
//! - Logging and tracing infrastructure
//! - Service configuration and bridge wiring
//!
//! ## Overview
//!
//! Other crates depend on this one for the logging conventions (targets,
//! redaction of signed URLs) and for the fail-fast configuration builder that
//! gathers the host-provided bridges before any service is constructed.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
