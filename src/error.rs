//! Unified error types for dacpipe

use thiserror::Error;

/// Main error type for dacpipe operations
#[derive(Error, Debug)]
pub enum Error {
    /// No output format could be negotiated for the device
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// No converter exists for the requested format pair
    #[error("Not a supported conversion {src} -> {dest}")]
    UnsupportedConversion { src: String, dest: String },

    /// Malformed sample format description
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Stream is in the wrong state for the requested operation
    #[error("Invalid stream state: {0}")]
    InvalidState(String),

    /// Device buffer operation error
    #[error("Device error: {0}")]
    Device(String),

    /// Producer read error
    #[error("Source error: {0}")]
    Source(String),

    /// IO error reading/writing config file
    #[error("Failed to access config file '{path}': {source}")]
    ConfigIo {
        path: String,
        source: std::io::Error,
    },

    /// Error parsing TOML config
    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: String,
        source: toml::de::Error,
    },

    /// Error serializing config
    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

/// Result type alias for dacpipe operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a device error with context
    pub fn device(message: impl Into<String>) -> Self {
        Self::Device(message.into())
    }

    /// Create a producer error with context
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Check if this error is recoverable (can retry with different parameters
    /// or on the next buffer cycle)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Device(_) | Error::Source(_) | Error::UnsupportedFormat(_)
        )
    }
}
