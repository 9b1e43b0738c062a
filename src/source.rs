//! Producer interface feeding the refill drivers

use crate::error::Result;
use crate::format::SampleFormat;

/// A producer of interleaved sample bytes in one fixed format.
///
/// `read` fills as much of `buf` as it can and returns the byte count. A
/// short read signals the source is running out; zero means fully exhausted.
/// Errors are recoverable from the stream's point of view: the refill driver
/// substitutes silence and keeps the cycle going.
pub trait SampleSource: Send {
    /// Format of the bytes produced by `read`.
    fn format(&self) -> SampleFormat;

    /// Fill `buf` with up to `buf.len()` bytes, returning how many were written.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Produces silence forever. DSD silence is the idle pattern, PCM silence
/// is zeros.
pub struct SilenceSource {
    format: SampleFormat,
    fill: u8,
}

impl SilenceSource {
    pub fn new(format: SampleFormat) -> Self {
        let fill = match format.encoding {
            crate::format::SampleEncoding::Dsd => crate::convert::DSD_IDLE,
            _ => 0,
        };
        Self { format, fill }
    }
}

impl SampleSource for SilenceSource {
    fn format(&self) -> SampleFormat {
        self.format
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        buf.fill(self.fill);
        Ok(buf.len())
    }
}

/// Plays back a fixed byte buffer once, then reports exhaustion.
pub struct MemorySource {
    format: SampleFormat,
    data: Vec<u8>,
    position: usize,
}

impl MemorySource {
    pub fn new(format: SampleFormat, data: Vec<u8>) -> Self {
        Self {
            format,
            data,
            position: 0,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl SampleSource for MemorySource {
    fn format(&self) -> SampleFormat {
        self.format
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}
