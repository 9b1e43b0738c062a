//! Converters producing per-channel planar device buffers
//!
//! This is the converter family for the callback-style transport whose
//! hardware hands out one memory region per output channel. Selection is a
//! total function over the supported table; an unmatched pair is a
//! negotiation-time configuration error, never a mid-stream one.

use super::sample::{clamp_to_i16, clamp_to_i24, clamp_to_i32, i32_to_f32};
use super::{dop, planar_map, I24};
use crate::error::{Error, Result};
use crate::format::{SampleEncoding, SampleFormat};

/// Numeric conversion rule for one negotiated (source, destination) pair,
/// planar destination family.
///
/// Integer narrowing to 16 bits on this path truncates (`>> 16`); the
/// interleaved family rounds instead. Both rules are deliberate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanarConverter {
    Int16ToInt32,
    Int24ToInt32,
    Int32ToInt32,
    FloatToInt32,
    Int16ToInt16,
    Int32ToInt16,
    FloatToInt16,
    Int16ToInt24,
    Int24ToInt24,
    Int32ToInt24,
    FloatToInt24,
    Int32ToFloat,
    FloatToFloat,
    DsdToDop24,
    DsdToDop32,
    DsdNative,
}

impl PlanarConverter {
    /// Select the converter for a negotiated format pair.
    pub fn select(source: &SampleFormat, dest: &SampleFormat) -> Result<Self> {
        use SampleEncoding::*;
        let unsupported = || Error::UnsupportedConversion {
            src: source.to_string(),
            dest: dest.to_string(),
        };

        let converter = match (dest.encoding, dest.bits_per_sample) {
            (Dsd, 1) => match source.encoding {
                Dsd => Self::DsdNative,
                _ => return Err(unsupported()),
            },
            (Pcm, 32) | (Dop, 32) => match (source.encoding, source.bits_per_sample) {
                (Dsd, 1) => Self::DsdToDop32,
                (Pcm, 16) => Self::Int16ToInt32,
                (Pcm, 24) => Self::Int24ToInt32,
                (Pcm, 32) => Self::Int32ToInt32,
                (Float, 32) => Self::FloatToInt32,
                _ => return Err(unsupported()),
            },
            (Pcm, 16) => match (source.encoding, source.bits_per_sample) {
                (Pcm, 16) => Self::Int16ToInt16,
                (Pcm, 32) => Self::Int32ToInt16,
                (Float, 32) => Self::FloatToInt16,
                _ => return Err(unsupported()),
            },
            (Pcm, 24) | (Dop, 24) => match (source.encoding, source.bits_per_sample) {
                (Dsd, 1) => Self::DsdToDop24,
                (Pcm, 16) => Self::Int16ToInt24,
                (Pcm, 24) => Self::Int24ToInt24,
                (Pcm, 32) => Self::Int32ToInt24,
                (Float, 32) => Self::FloatToInt24,
                _ => return Err(unsupported()),
            },
            (Float, 32) => match (source.encoding, source.bits_per_sample) {
                (Pcm, 32) => Self::Int32ToFloat,
                (Float, 32) => Self::FloatToFloat,
                _ => return Err(unsupported()),
            },
            _ => return Err(unsupported()),
        };
        Ok(converter)
    }

    /// True when the source side is a raw DSD payload.
    pub fn consumes_dsd(&self) -> bool {
        matches!(self, Self::DsdToDop24 | Self::DsdToDop32 | Self::DsdNative)
    }

    /// Convert `frames` interleaved source frames into one destination region
    /// per output channel. `frames == 0` is a no-op. The caller owns sizing:
    /// each destination must hold `frames` samples in the destination width.
    pub fn convert(
        &self,
        src: &[u8],
        dsts: &mut [&mut [u8]],
        src_channels: usize,
        frames: usize,
    ) {
        match self {
            Self::Int16ToInt32 => {
                planar_map(src, dsts, src_channels, frames, |v: i16| {
                    i32::from(v) << 16
                });
            }
            Self::Int24ToInt32 => {
                planar_map(src, dsts, src_channels, frames, |v: I24| v.0);
            }
            Self::Int32ToInt32 => {
                planar_map(src, dsts, src_channels, frames, |v: i32| v);
            }
            Self::FloatToInt32 => {
                planar_map(src, dsts, src_channels, frames, clamp_to_i32);
            }
            Self::Int16ToInt16 => {
                planar_map(src, dsts, src_channels, frames, |v: i16| v);
            }
            Self::Int32ToInt16 => {
                // truncating narrow, not rounded
                planar_map(src, dsts, src_channels, frames, |v: i32| (v >> 16) as i16);
            }
            Self::FloatToInt16 => {
                planar_map(src, dsts, src_channels, frames, clamp_to_i16);
            }
            Self::Int16ToInt24 => {
                planar_map(src, dsts, src_channels, frames, |v: i16| {
                    I24(i32::from(v) << 16)
                });
            }
            Self::Int24ToInt24 => {
                planar_map(src, dsts, src_channels, frames, |v: I24| v);
            }
            Self::Int32ToInt24 => {
                planar_map(src, dsts, src_channels, frames, |v: i32| I24(v));
            }
            Self::FloatToInt24 => {
                planar_map(src, dsts, src_channels, frames, |v: f32| {
                    I24(clamp_to_i24(v) << 8)
                });
            }
            Self::Int32ToFloat => {
                planar_map(src, dsts, src_channels, frames, i32_to_f32);
            }
            Self::FloatToFloat => {
                planar_map(src, dsts, src_channels, frames, |v: f32| v);
            }
            Self::DsdToDop24 => dop::dsd_to_dop_planar(src, dsts, src_channels, frames, false),
            Self::DsdToDop32 => dop::dsd_to_dop_planar(src, dsts, src_channels, frames, true),
            Self::DsdNative => dop::dsd_native_planar(src, dsts, src_channels, frames),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i16_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn i32_of(bytes: &[u8]) -> Vec<i32> {
        bytes
            .chunks(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_select_supported_pairs() {
        let stereo16 = SampleFormat::pcm(44100, 16, 2);
        let stereo32 = SampleFormat::pcm(44100, 32, 2);
        let float32 = SampleFormat::float(44100, 2);
        let dsd = SampleFormat::dsd(2_822_400, 2);

        assert_eq!(
            PlanarConverter::select(&stereo16, &stereo32).unwrap(),
            PlanarConverter::Int16ToInt32
        );
        assert_eq!(
            PlanarConverter::select(&float32, &SampleFormat::pcm(44100, 24, 2)).unwrap(),
            PlanarConverter::FloatToInt24
        );
        assert_eq!(
            PlanarConverter::select(&dsd, &SampleFormat::dop(176_400, 32, 2)).unwrap(),
            PlanarConverter::DsdToDop32
        );
        assert_eq!(
            PlanarConverter::select(&dsd, &dsd).unwrap(),
            PlanarConverter::DsdNative
        );
    }

    #[test]
    fn test_select_unsupported_pair_is_config_error() {
        // 16-bit PCM into a float device is not in the table
        let err = PlanarConverter::select(
            &SampleFormat::pcm(44100, 16, 2),
            &SampleFormat::float(44100, 2),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedConversion { .. }));
    }

    #[test]
    fn test_i16_to_i32_upper_placement() {
        let src = i16_bytes(&[100, -200, 300, -400]);
        let mut left = [0u8; 8];
        let mut right = [0u8; 8];
        {
            let mut dsts: [&mut [u8]; 2] = [&mut left, &mut right];
            PlanarConverter::Int16ToInt32.convert(&src, &mut dsts, 2, 2);
        }
        assert_eq!(i32_of(&left), [100 << 16, 300 << 16]);
        assert_eq!(i32_of(&right), [-200 << 16, -400 << 16]);
    }

    #[test]
    fn test_mono_fan_out_is_byte_identical() {
        let src = i16_bytes(&[1000, -1000, 32000]);
        let mut left = [0u8; 12];
        let mut right = [0u8; 12];
        {
            let mut dsts: [&mut [u8]; 2] = [&mut left, &mut right];
            PlanarConverter::Int16ToInt32.convert(&src, &mut dsts, 1, 3);
        }
        assert_eq!(left, right);
        assert_eq!(i32_of(&left), [1000 << 16, -1000 << 16, 32000 << 16]);
    }

    #[test]
    fn test_mono_into_three_channels_fills_first_two() {
        let src = i16_bytes(&[1000]);
        let mut out: Vec<[u8; 4]> = vec![[0xAA; 4]; 3];
        {
            let mut slices: Vec<&mut [u8]> = out.iter_mut().map(|c| &mut c[..]).collect();
            PlanarConverter::Int16ToInt32.convert(&src, &mut slices, 1, 1);
        }
        assert_eq!(i32_of(&out[0]), [1000 << 16]);
        assert_eq!(i32_of(&out[1]), [1000 << 16]);
        assert_eq!(i32_of(&out[2]), [0]);
    }

    #[test]
    fn test_generic_drops_excess_source_channels() {
        // 3 source channels into 2 outputs: channel 2 consumed, never written
        let src = i16_bytes(&[1, 2, 3, 4, 5, 6]);
        let mut left = [0u8; 4];
        let mut right = [0u8; 4];
        {
            let mut dsts: [&mut [u8]; 2] = [&mut left, &mut right];
            PlanarConverter::Int16ToInt16.convert(&src, &mut dsts, 3, 2);
        }
        assert_eq!(i16::from_le_bytes([left[0], left[1]]), 1);
        assert_eq!(i16::from_le_bytes([left[2], left[3]]), 4);
        assert_eq!(i16::from_le_bytes([right[0], right[1]]), 2);
        assert_eq!(i16::from_le_bytes([right[2], right[3]]), 5);
    }

    #[test]
    fn test_generic_pads_missing_source_channels() {
        // stereo into 3 outputs: channel 2 gets silence every frame
        let src = i16_bytes(&[7, 8, 9, 10]);
        let mut out: Vec<[u8; 4]> = vec![[0xAA; 4]; 3];
        {
            let mut slices: Vec<&mut [u8]> = out.iter_mut().map(|c| &mut c[..]).collect();
            PlanarConverter::Int16ToInt16.convert(&src, &mut slices, 2, 2);
        }
        assert_eq!(out[2], [0, 0, 0, 0]);
        assert_eq!(i16::from_le_bytes([out[0][0], out[0][1]]), 7);
        assert_eq!(i16::from_le_bytes([out[1][0], out[1][1]]), 8);
    }

    #[test]
    fn test_i32_to_i16_truncates() {
        let src: Vec<u8> = [0x0001_8000i32, -0x0001_8000]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut left = [0u8; 2];
        let mut right = [0u8; 2];
        {
            let mut dsts: [&mut [u8]; 2] = [&mut left, &mut right];
            PlanarConverter::Int32ToInt16.convert(&src, &mut dsts, 2, 1);
        }
        assert_eq!(i16::from_le_bytes(left), 1);
        assert_eq!(i16::from_le_bytes(right), -2);
    }

    #[test]
    fn test_i24_to_i32_byte_shift() {
        // one frame, packed 24-bit little-endian
        let src = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06];
        let mut left = [0u8; 4];
        let mut right = [0u8; 4];
        {
            let mut dsts: [&mut [u8]; 2] = [&mut left, &mut right];
            PlanarConverter::Int24ToInt32.convert(&src, &mut dsts, 2, 1);
        }
        assert_eq!(i32::from_le_bytes(left), 0x0302_0100);
        assert_eq!(i32::from_le_bytes(right), 0x0605_0400);
    }

    #[test]
    fn test_i32_to_i24_drops_low_byte() {
        let src = 0x1234_5678i32.to_le_bytes();
        let mut out = [0u8; 3];
        {
            let mut dsts: [&mut [u8]; 1] = [&mut out];
            PlanarConverter::Int32ToInt24.convert(&src, &mut dsts, 1, 1);
        }
        assert_eq!(out, [0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_equal_channels_beyond_stereo_take_generic_path() {
        let src = i16_bytes(&[1, 2, 3, 4]);
        let mut out: Vec<[u8; 2]> = vec![[0xFF; 2]; 4];
        {
            let mut slices: Vec<&mut [u8]> = out.iter_mut().map(|c| &mut c[..]).collect();
            PlanarConverter::Int16ToInt16.convert(&src, &mut slices, 4, 1);
        }
        for (ch, expected) in out.iter().zip([1i16, 2, 3, 4]) {
            assert_eq!(i16::from_le_bytes(*ch), expected);
        }
    }

    #[test]
    fn test_zero_frames_is_noop() {
        let mut out = [0xABu8; 4];
        {
            let mut dsts: [&mut [u8]; 1] = [&mut out];
            PlanarConverter::Int16ToInt16.convert(&[], &mut dsts, 2, 0);
        }
        assert_eq!(out, [0xAB; 4]);
    }
}
