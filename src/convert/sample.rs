//! Scalar clamping and quantization primitives
//!
//! Each conversion is a fixed bit-manipulation rule. The rounding
//! (`rounded_shift_16`) and truncating (`v >> 16`) narrowing paths both
//! exist on purpose: the planar transport narrows by truncation and the
//! interleaved transport narrows with rounding, and unifying them would
//! change audible output.

/// Clamp a normalized float to [-1.0, 1.0] and scale to a 16-bit integer.
#[inline]
pub fn clamp_to_i16(value: f32) -> i16 {
    (f64::from(value).clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Clamp a normalized float to [-1.0, 1.0] and scale to a 24-bit integer.
#[inline]
pub fn clamp_to_i24(value: f32) -> i32 {
    (f64::from(value).clamp(-1.0, 1.0) * 8_388_607.0) as i32
}

/// Clamp a normalized float to [-1.0, 1.0] and scale to a 32-bit integer.
#[inline]
pub fn clamp_to_i32(value: f32) -> i32 {
    (f64::from(value).clamp(-1.0, 1.0) * 2_147_483_647.0) as i32
}

/// Narrow a 32-bit sample to 16 bits with rounding: add half-scale bias
/// before the shift, saturating at the 16-bit bounds.
#[inline]
pub fn rounded_shift_16(value: i32) -> i16 {
    let rounded = ((value >> 15) + 1) >> 1;
    rounded.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Normalize a 32-bit integer sample to float against the 32-bit reference scale.
#[inline]
pub fn i32_to_f32(value: i32) -> f32 {
    value as f32 / 2_147_483_648.0
}

/// Read a packed little-endian 24-bit sample, left-aligned into an i32
/// (bits 8..31 carry the sample, the low byte is zero).
#[inline]
pub fn read_i24(bytes: &[u8]) -> i32 {
    (i32::from(bytes[0]) << 8) | (i32::from(bytes[1]) << 16) | (i32::from(bytes[2]) << 24)
}

/// Write the top three bytes of a left-aligned 24-bit sample at 3-byte stride.
#[inline]
pub fn write_i24(value: i32, bytes: &mut [u8]) {
    bytes[0] = (value >> 8) as u8;
    bytes[1] = (value >> 16) as u8;
    bytes[2] = (value >> 24) as u8;
}
