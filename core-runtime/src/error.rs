use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Logging already initialized: {0}")]
    LoggingInitialized(String),
}

pub type Result<T> = std::result::Result<T, Error>;
