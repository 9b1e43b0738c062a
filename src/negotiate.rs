//! Output format negotiation
//!
//! Given a source format and a device capability probe, find a device format
//! the conversion engine can target. Exact match is tried first; otherwise a
//! fallback grid of candidate rates, channel counts and bit depths is walked
//! in a fixed order. Negotiation is the only place format support is decided;
//! after it succeeds, converter selection cannot fail.

use tracing::{debug, info};

use crate::config::RateLimits;
use crate::error::{Error, Result};
use crate::format::{SampleEncoding, SampleFormat};

/// Capability probe for one output device.
pub trait DeviceCaps {
    /// Whether the device accepts this exact format.
    fn is_format_supported(&self, format: &SampleFormat) -> bool;

    /// The device's preferred (mix) format.
    fn mix_format(&self) -> SampleFormat;
}

/// Negotiate a device format for `source`, honoring the configured rate
/// allow-lists.
pub fn negotiate(
    source: &SampleFormat,
    caps: &dyn DeviceCaps,
    limits: &RateLimits,
) -> Result<SampleFormat> {
    source.validate()?;
    let found = match source.encoding {
        SampleEncoding::Dsd => negotiate_dsd(source, caps, limits),
        SampleEncoding::Pcm | SampleEncoding::Float => negotiate_pcm(source, caps, limits),
        SampleEncoding::Dop => None,
    };
    match found {
        Some(format) => {
            info!(source = %source, device = %format, "negotiated output format");
            Ok(format)
        }
        None => Err(Error::UnsupportedFormat(source.to_string())),
    }
}

fn negotiate_pcm(
    source: &SampleFormat,
    caps: &dyn DeviceCaps,
    limits: &RateLimits,
) -> Option<SampleFormat> {
    if limits.allows(source.encoding, source.sample_rate) && caps.is_format_supported(source) {
        return Some(*source);
    }

    let mix = caps.mix_format();
    let channels = dedup([source.channels, mix.channels, 2]);
    let bits = dedup([source.bits_per_sample, 32, 24, 16]);
    let try_float = mix.encoding == SampleEncoding::Float;

    for rate in candidate_rates(source.sample_rate) {
        if !limits.allows(SampleEncoding::Pcm, rate) {
            continue;
        }
        for &ch in &channels {
            // a float mix format means the device prefers float, probe it
            // before the integer depths
            if try_float {
                let candidate = SampleFormat::float(rate, ch);
                if caps.is_format_supported(&candidate) {
                    debug!(candidate = %candidate, "fallback format accepted");
                    return Some(candidate);
                }
            }
            for &b in &bits {
                let candidate = SampleFormat::pcm(rate, b, ch);
                if caps.is_format_supported(&candidate) {
                    debug!(candidate = %candidate, "fallback format accepted");
                    return Some(candidate);
                }
            }
        }
    }
    None
}

fn negotiate_dsd(
    source: &SampleFormat,
    caps: &dyn DeviceCaps,
    limits: &RateLimits,
) -> Option<SampleFormat> {
    // native pass-through wins when the hardware takes raw DSD
    if caps.is_format_supported(source) {
        return Some(*source);
    }

    // otherwise DoP: PCM frame rate is the DSD bit rate / 16
    let dop_rate = source.sample_rate / 16;
    if !limits.allows(SampleEncoding::Dop, dop_rate) {
        return None;
    }
    let mix = caps.mix_format();
    let channels = dedup([source.channels, mix.channels, 2]);
    for &bits in &[32u16, 24] {
        for &ch in &channels {
            let candidate = SampleFormat::dop(dop_rate, bits, ch);
            if caps.is_format_supported(&candidate) {
                debug!(candidate = %candidate, "DoP format accepted");
                return Some(candidate);
            }
        }
    }
    None
}

/// Candidate device rates for a source rate: multiples of the source's base
/// rate family (44.1k or 48k), those at or above the source rate in
/// ascending order first, then those below in descending order.
fn candidate_rates(source_rate: u32) -> Vec<u32> {
    let base = if source_rate % 44100 == 0 { 44100 } else { 48000 };
    let all: Vec<u32> = [1u32, 2, 4, 8].iter().map(|i| i * base).collect();
    let mut rates: Vec<u32> = all.iter().copied().filter(|&r| r >= source_rate).collect();
    let mut lower: Vec<u32> = all.iter().copied().filter(|&r| r < source_rate).collect();
    lower.reverse();
    rates.extend(lower);
    rates
}

fn dedup<const N: usize>(values: [u16; N]) -> Vec<u16> {
    let mut out = Vec::with_capacity(N);
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}
