//! Sample format conversion engine
//!
//! Pure, stateless converters mapping one interleaved source buffer to either
//! per-channel planar destinations or a single interleaved destination, in the
//! destination's native byte layout. A converter is selected once per format
//! negotiation and invoked every buffer cycle; nothing here allocates.
//!
//! The numeric rule (which bit manipulation maps a source sample to a
//! destination sample) and the shape class (mono fan-out, unrolled stereo,
//! generic N-to-M) are independent axes: each converter variant binds a
//! numeric rule, and the shared shape loops below apply it.

mod dop;
mod interleaved;
mod planar;
pub mod sample;

pub use dop::{DOP_MARKER_A, DOP_MARKER_B, DSD_IDLE};
pub use interleaved::InterleavedConverter;
pub use planar::PlanarConverter;

use sample::{read_i24, write_i24};

/// Fixed-width sample codec driven by the shape loops.
pub(crate) trait RawSample: Copy {
    const BYTES: usize;
    const SILENCE: Self;
    fn load(bytes: &[u8]) -> Self;
    fn store(self, bytes: &mut [u8]);
}

impl RawSample for i16 {
    const BYTES: usize = 2;
    const SILENCE: Self = 0;
    #[inline]
    fn load(bytes: &[u8]) -> Self {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }
    #[inline]
    fn store(self, bytes: &mut [u8]) {
        bytes[..2].copy_from_slice(&self.to_le_bytes());
    }
}

impl RawSample for i32 {
    const BYTES: usize = 4;
    const SILENCE: Self = 0;
    #[inline]
    fn load(bytes: &[u8]) -> Self {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
    #[inline]
    fn store(self, bytes: &mut [u8]) {
        bytes[..4].copy_from_slice(&self.to_le_bytes());
    }
}

impl RawSample for f32 {
    const BYTES: usize = 4;
    const SILENCE: Self = 0.0;
    #[inline]
    fn load(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
    #[inline]
    fn store(self, bytes: &mut [u8]) {
        bytes[..4].copy_from_slice(&self.to_le_bytes());
    }
}

/// Packed 24-bit sample, carried left-aligned in an i32 (low byte zero).
#[derive(Clone, Copy)]
pub(crate) struct I24(pub i32);

impl RawSample for I24 {
    const BYTES: usize = 3;
    const SILENCE: Self = I24(0);
    #[inline]
    fn load(bytes: &[u8]) -> Self {
        I24(read_i24(bytes))
    }
    #[inline]
    fn store(self, bytes: &mut [u8]) {
        write_i24(self.0, bytes);
    }
}

/// Shaped conversion into per-channel planar destinations.
///
/// A mono source fans out to the first two output channels, with silence on
/// any channels beyond those. Everything else that is not exactly stereo to
/// stereo goes through the generic loop, which writes silence to output
/// channels with no source and consumes source channels with no output so
/// every destination slot ends up defined.
pub(crate) fn planar_map<S: RawSample, D: RawSample>(
    src: &[u8],
    dsts: &mut [&mut [u8]],
    src_channels: usize,
    frames: usize,
    map: impl Fn(S) -> D,
) {
    let dst_channels = dsts.len();

    // optimized mono fan-out
    if src_channels == 1 && dst_channels >= 2 {
        for i in 0..frames {
            let value = map(S::load(&src[i * S::BYTES..]));
            value.store(&mut dsts[0][i * D::BYTES..]);
            value.store(&mut dsts[1][i * D::BYTES..]);
            for dst in dsts[2..].iter_mut() {
                D::SILENCE.store(&mut dst[i * D::BYTES..]);
            }
        }
    }
    // optimized stereo to stereo
    else if src_channels == 2 && dst_channels == 2 {
        let (left, right) = dsts.split_at_mut(1);
        let left = &mut *left[0];
        let right = &mut *right[0];
        let mut s = 0;
        for i in 0..frames {
            map(S::load(&src[s..])).store(&mut left[i * D::BYTES..]);
            map(S::load(&src[s + S::BYTES..])).store(&mut right[i * D::BYTES..]);
            s += 2 * S::BYTES;
        }
    }
    // generic
    else {
        let max = src_channels.max(dst_channels);
        let min = src_channels.min(dst_channels);
        let mut s = 0;
        for i in 0..frames {
            for j in 0..max {
                if j < min {
                    map(S::load(&src[s..])).store(&mut dsts[j][i * D::BYTES..]);
                    s += S::BYTES;
                } else if j >= dst_channels {
                    // drop excess source channel, keep the interleave aligned
                    s += S::BYTES;
                }
                if j >= src_channels {
                    D::SILENCE.store(&mut dsts[j][i * D::BYTES..]);
                }
            }
        }
    }
}

/// Shaped conversion into a single interleaved destination.
pub(crate) fn interleaved_map<S: RawSample, D: RawSample>(
    src: &[u8],
    dst: &mut [u8],
    src_channels: usize,
    dst_channels: usize,
    frames: usize,
    map: impl Fn(S) -> D,
) {
    // optimized mono fan-out
    if src_channels == 1 && dst_channels >= 2 {
        let mut d = 0;
        for i in 0..frames {
            let value = map(S::load(&src[i * S::BYTES..]));
            value.store(&mut dst[d..]);
            value.store(&mut dst[d + D::BYTES..]);
            d += 2 * D::BYTES;
            for _ in 2..dst_channels {
                D::SILENCE.store(&mut dst[d..]);
                d += D::BYTES;
            }
        }
    }
    // optimized stereo to stereo
    else if src_channels == 2 && dst_channels == 2 {
        let mut s = 0;
        let mut d = 0;
        for _ in 0..frames {
            map(S::load(&src[s..])).store(&mut dst[d..]);
            map(S::load(&src[s + S::BYTES..])).store(&mut dst[d + D::BYTES..]);
            s += 2 * S::BYTES;
            d += 2 * D::BYTES;
        }
    }
    // generic
    else {
        let max = src_channels.max(dst_channels);
        let min = src_channels.min(dst_channels);
        let mut s = 0;
        let mut d = 0;
        for _ in 0..frames {
            for j in 0..max {
                if j < min {
                    map(S::load(&src[s..])).store(&mut dst[d..]);
                    s += S::BYTES;
                    d += D::BYTES;
                } else if j >= dst_channels {
                    s += S::BYTES;
                }
                if j >= src_channels {
                    D::SILENCE.store(&mut dst[d..]);
                    d += D::BYTES;
                }
            }
        }
    }
}
