//! DSD payload packing: DoP encapsulation and native DSD pass-through
//!
//! DoP packs two DSD payload bytes per channel into each 24- or 32-bit
//! destination frame, tagged with the marker byte alternating 0x05/0xFA per
//! frame pair. 32-bit containers carry a leading 0x69 filler byte. An odd
//! frame count is floored to an even one: DoP operates on sample pairs and
//! the hot path must not panic on a caller error.

/// Marker byte for the first frame of a DoP pair
pub const DOP_MARKER_A: u8 = 0x05;
/// Marker byte for the second frame of a DoP pair
pub const DOP_MARKER_B: u8 = 0xFA;
/// Idle/filler byte: pads unused container bytes and silent DSD channels
pub const DSD_IDLE: u8 = 0x69;

/// Payload source byte for destination channel `j`: a mono source fans out to
/// every destination channel, extra destination channels beyond the source
/// count get idle payload.
#[inline]
fn payload(src: &[u8], src_channels: usize, byte_frame: usize, j: usize) -> u8 {
    let ch = if src_channels == 1 { 0 } else { j };
    if ch < src_channels {
        src[byte_frame * src_channels + ch]
    } else {
        DSD_IDLE
    }
}

/// Pack interleaved DSD bytes into per-channel planar DoP frames.
///
/// `wide` selects the 32-bit container (leading 0x69 filler) over 24-bit.
/// Each output frame consumes one DSD byte per channel; bytes are emitted
/// second-then-first within each pair.
pub(crate) fn dsd_to_dop_planar(
    src: &[u8],
    dsts: &mut [&mut [u8]],
    src_channels: usize,
    frames: usize,
    wide: bool,
) {
    let width = if wide { 4 } else { 3 };
    let groups = frames / 2;
    for g in 0..groups {
        let base = g * 4;
        for (j, dst) in dsts.iter_mut().enumerate() {
            let mut d = g * 2 * width;
            for (first, second, marker) in [
                (base, base + 1, DOP_MARKER_A),
                (base + 2, base + 3, DOP_MARKER_B),
            ] {
                if wide {
                    dst[d] = DSD_IDLE;
                    d += 1;
                }
                dst[d] = payload(src, src_channels, second, j);
                dst[d + 1] = payload(src, src_channels, first, j);
                dst[d + 2] = marker;
                d += 3;
            }
        }
    }
}

/// Pack interleaved DSD bytes into interleaved DoP frames.
pub(crate) fn dsd_to_dop_interleaved(
    src: &[u8],
    dst: &mut [u8],
    src_channels: usize,
    dst_channels: usize,
    frames: usize,
    wide: bool,
) {
    let width = if wide { 4 } else { 3 };
    let groups = frames / 2;
    for g in 0..groups {
        let base = g * 4;
        let mut d = g * 2 * dst_channels * width;
        for (first, second, marker) in [
            (base, base + 1, DOP_MARKER_A),
            (base + 2, base + 3, DOP_MARKER_B),
        ] {
            for j in 0..dst_channels {
                if wide {
                    dst[d] = DSD_IDLE;
                    d += 1;
                }
                dst[d] = payload(src, src_channels, second, j);
                dst[d + 1] = payload(src, src_channels, first, j);
                dst[d + 2] = marker;
                d += 3;
            }
        }
    }
}

/// De-interleave raw DSD bytes into per-channel planar regions for devices
/// that accept native DSD. `frames` counts 1-bit samples; eight of them make
/// one byte per channel.
pub(crate) fn dsd_native_planar(
    src: &[u8],
    dsts: &mut [&mut [u8]],
    src_channels: usize,
    frames: usize,
) {
    let bytes = frames / 8;
    for b in 0..bytes {
        for (j, dst) in dsts.iter_mut().enumerate() {
            dst[b] = payload(src, src_channels, b, j);
        }
    }
}
