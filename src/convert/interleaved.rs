//! Converters producing a single interleaved device buffer
//!
//! This is the converter family for the shared-buffer transport whose device
//! exposes one interleaved region per refill. Unlike the planar family,
//! selection also checks the sample rate: this transport cannot resample, so
//! a rate mismatch is rejected up front (DoP destinations run at the DSD bit
//! rate divided by 16).

use super::sample::{clamp_to_i16, clamp_to_i32, rounded_shift_16};
use super::{dop, interleaved_map, I24};
use crate::error::{Error, Result};
use crate::format::{SampleEncoding, SampleFormat};

/// Numeric conversion rule for one negotiated (source, destination) pair,
/// interleaved destination family.
///
/// Integer narrowing to 16 bits on this path rounds with a half-scale bias;
/// the planar family truncates. Both rules are deliberate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterleavedConverter {
    Int16ToInt16,
    Int16ToInt32,
    Int24ToInt16,
    Int24ToInt32,
    Int32ToInt16,
    Int32ToInt32,
    FloatToInt16,
    FloatToInt32,
    DsdToDop24,
    DsdToDop32,
}

impl InterleavedConverter {
    /// Select the converter for a negotiated format pair, verifying the rates
    /// line up for the chosen encoding.
    pub fn select(source: &SampleFormat, dest: &SampleFormat) -> Result<Self> {
        use SampleEncoding::*;
        let unsupported = || Error::UnsupportedConversion {
            src: source.to_string(),
            dest: dest.to_string(),
        };

        let rate_ok = match (source.encoding, dest.encoding) {
            (Dsd, Dop) => dest.sample_rate == source.sample_rate / 16,
            _ => dest.sample_rate == source.sample_rate,
        };
        if !rate_ok {
            return Err(unsupported());
        }

        let converter = match (
            source.encoding,
            source.bits_per_sample,
            dest.encoding,
            dest.bits_per_sample,
        ) {
            (Pcm, 16, Pcm, 16) => Self::Int16ToInt16,
            (Pcm, 16, Pcm, 32) => Self::Int16ToInt32,
            (Pcm, 24, Pcm, 16) => Self::Int24ToInt16,
            (Pcm, 24, Pcm, 32) => Self::Int24ToInt32,
            (Pcm, 32, Pcm, 16) => Self::Int32ToInt16,
            (Pcm, 32, Pcm, 32) => Self::Int32ToInt32,
            (Float, 32, Pcm, 16) => Self::FloatToInt16,
            (Float, 32, Pcm, 32) => Self::FloatToInt32,
            (Dsd, 1, Dop, 24) => Self::DsdToDop24,
            (Dsd, 1, Dop, 32) => Self::DsdToDop32,
            _ => return Err(unsupported()),
        };
        Ok(converter)
    }

    /// True when the source side is a raw DSD payload.
    pub fn consumes_dsd(&self) -> bool {
        matches!(self, Self::DsdToDop24 | Self::DsdToDop32)
    }

    /// Convert `frames` interleaved source frames into the interleaved
    /// destination. `frames == 0` is a no-op. The caller owns sizing: `dst`
    /// must hold `frames * dst_channels` samples in the destination width.
    pub fn convert(
        &self,
        src: &[u8],
        dst: &mut [u8],
        src_channels: usize,
        dst_channels: usize,
        frames: usize,
    ) {
        match self {
            Self::Int16ToInt16 => {
                interleaved_map(src, dst, src_channels, dst_channels, frames, |v: i16| v);
            }
            Self::Int16ToInt32 => {
                interleaved_map(src, dst, src_channels, dst_channels, frames, |v: i16| {
                    i32::from(v) << 16
                });
            }
            Self::Int24ToInt16 => {
                interleaved_map(src, dst, src_channels, dst_channels, frames, |v: I24| {
                    rounded_shift_16(v.0)
                });
            }
            Self::Int24ToInt32 => {
                interleaved_map(src, dst, src_channels, dst_channels, frames, |v: I24| v.0);
            }
            Self::Int32ToInt16 => {
                interleaved_map(
                    src,
                    dst,
                    src_channels,
                    dst_channels,
                    frames,
                    rounded_shift_16,
                );
            }
            Self::Int32ToInt32 => {
                interleaved_map(src, dst, src_channels, dst_channels, frames, |v: i32| v);
            }
            Self::FloatToInt16 => {
                interleaved_map(src, dst, src_channels, dst_channels, frames, clamp_to_i16);
            }
            Self::FloatToInt32 => {
                interleaved_map(src, dst, src_channels, dst_channels, frames, clamp_to_i32);
            }
            Self::DsdToDop24 => {
                dop::dsd_to_dop_interleaved(src, dst, src_channels, dst_channels, frames, false);
            }
            Self::DsdToDop32 => {
                dop::dsd_to_dop_interleaved(src, dst, src_channels, dst_channels, frames, true);
            }
        }
    }
}
