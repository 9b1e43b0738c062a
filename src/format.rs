//! Sample format descriptions shared by converters, negotiation and streams

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How sample values are encoded in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleEncoding {
    /// Linear PCM integers (8/16/24/32 bit, little-endian, 24-bit packed in 3 bytes)
    Pcm,
    /// IEEE 32-bit float, normalized to [-1.0, 1.0]
    Float,
    /// 1-bit DSD, one byte per channel per byte-frame, interleaved by channel
    Dsd,
    /// DSD-over-PCM: DSD payload packed into 24/32-bit PCM-shaped containers
    /// with marker bytes. Output-side only, produced by negotiation.
    Dop,
}

impl std::fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SampleEncoding::Pcm => "PCM",
            SampleEncoding::Float => "float",
            SampleEncoding::Dsd => "DSD",
            SampleEncoding::Dop => "DoP",
        };
        write!(f, "{}", name)
    }
}

/// Audio format information for one side of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub encoding: SampleEncoding,
}

impl SampleFormat {
    /// Integer PCM format
    pub fn pcm(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        Self {
            sample_rate,
            bits_per_sample,
            channels,
            encoding: SampleEncoding::Pcm,
        }
    }

    /// IEEE float format (always 32 bit)
    pub fn float(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            bits_per_sample: 32,
            channels,
            encoding: SampleEncoding::Float,
        }
    }

    /// 1-bit DSD format. The sample rate is the DSD bit rate (e.g. 2822400 for DSD64).
    pub fn dsd(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            bits_per_sample: 1,
            channels,
            encoding: SampleEncoding::Dsd,
        }
    }

    /// DoP container format. The sample rate is the PCM frame rate (DSD rate / 16).
    pub fn dop(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        Self {
            sample_rate,
            bits_per_sample,
            channels,
            encoding: SampleEncoding::Dop,
        }
    }

    /// Check internal consistency of the format description
    pub fn validate(&self) -> Result<()> {
        let bits_ok = match self.encoding {
            SampleEncoding::Dsd => self.bits_per_sample == 1,
            SampleEncoding::Float => self.bits_per_sample == 32,
            SampleEncoding::Dop => matches!(self.bits_per_sample, 24 | 32),
            SampleEncoding::Pcm => matches!(self.bits_per_sample, 8 | 16 | 24 | 32),
        };
        if !bits_ok {
            return Err(Error::InvalidFormat(format!(
                "{} bits not valid for {}",
                self.bits_per_sample, self.encoding
            )));
        }
        if self.channels == 0 {
            return Err(Error::InvalidFormat("zero channels".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidFormat("zero sample rate".to_string()));
        }
        Ok(())
    }

    /// Bytes per frame. For DSD one byte per channel carries eight 1-bit samples,
    /// so block align is the per-byte-frame stride.
    pub fn block_align(&self) -> u16 {
        match self.encoding {
            SampleEncoding::Dsd => self.channels,
            _ => self.channels * (self.bits_per_sample / 8),
        }
    }

    /// Calculate bytes per second
    pub fn bytes_per_second(&self) -> u32 {
        match self.encoding {
            SampleEncoding::Dsd => self.sample_rate / 8 * u32::from(self.channels),
            _ => self.sample_rate * u32::from(self.block_align()),
        }
    }

    /// Calculate buffer size in bytes for given milliseconds
    pub fn buffer_bytes_for_ms(&self, ms: u32) -> usize {
        ((u64::from(self.bytes_per_second()) * u64::from(ms)) / 1000) as usize
    }

    /// Calculate number of frames for given bytes
    pub fn bytes_to_frames(&self, bytes: usize) -> usize {
        bytes / self.block_align() as usize
    }

    /// Calculate bytes for given number of frames
    pub fn frames_to_bytes(&self, frames: usize) -> usize {
        frames * self.block_align() as usize
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}Hz {}ch {}bit {}",
            self.sample_rate, self.channels, self.bits_per_sample, self.encoding
        )
    }
}
