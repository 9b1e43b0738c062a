//! dacpipe: sample format conversion and device buffer management for
//! bit-exact audio output.
//!
//! The crate sits between a sample producer ([`source::SampleSource`]) and a
//! low-latency output transport. [`convert`] holds the pure conversion
//! engine for planar and interleaved device buffers, including DSD-over-PCM
//! packing; [`negotiate`] picks a device format the engine can target;
//! [`stream`] drives the refill protocol for both transport families.

pub mod config;
pub mod convert;
pub mod device;
pub mod error;
pub mod format;
pub mod negotiate;
pub mod priority;
pub mod source;
pub mod stream;

pub use config::{PipeConfig, RateLimits};
pub use error::{Error, Result};
pub use format::{SampleEncoding, SampleFormat};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
