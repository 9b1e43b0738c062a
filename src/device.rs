//! Device buffer interface for the interleaved transport

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::Result;
use crate::format::SampleFormat;

/// One interleaved output endpoint as seen by the refill driver.
///
/// Implementations wrap a real driver binding. Borrowed-buffer semantics:
/// `write` must copy out of the slice during the call and retain nothing.
/// `current_padding` is the frame count queued but not yet played, so
/// `buffer_frames() - current_padding()` is the space a refill may fill.
pub trait OutputDevice: Send {
    /// Negotiated format this device was opened with.
    fn format(&self) -> SampleFormat;

    /// Total frame capacity of the device buffer.
    fn buffer_frames(&self) -> usize;

    /// Frames queued in the device buffer and not yet consumed.
    fn current_padding(&self) -> Result<usize>;

    /// Queue `frames` frames of interleaved data. `data` holds exactly
    /// `frames * block_align` bytes in the device format.
    fn write(&mut self, data: &[u8], frames: usize) -> Result<()>;

    /// Queue `frames` frames of silence.
    fn write_silence(&mut self, frames: usize) -> Result<()>;

    /// Start consuming the buffer.
    fn start(&mut self) -> Result<()>;

    /// Stop consuming the buffer.
    fn stop(&mut self) -> Result<()>;

    /// Block until the device signals buffer space, up to `timeout`.
    /// Returns false on timeout. Poll-driven devices just sleep and
    /// return true.
    fn wait_buffer_ready(&mut self, timeout: Duration) -> Result<bool>;
}

/// In-memory device double: records every byte written and simulates a
/// buffer that drains completely between refill cycles. Clones share the
/// recorded state, so tests keep a probe clone after handing the device to
/// a stream.
#[derive(Clone)]
pub struct LoopbackDevice {
    format: SampleFormat,
    buffer_frames: usize,
    inner: Arc<Mutex<LoopbackState>>,
}

#[derive(Default)]
struct LoopbackState {
    written: Vec<u8>,
    queued_frames: usize,
    started: bool,
    start_count: u32,
    stop_count: u32,
}

impl LoopbackDevice {
    pub fn new(format: SampleFormat, buffer_frames: usize) -> Self {
        Self {
            format,
            buffer_frames,
            inner: Arc::new(Mutex::new(LoopbackState::default())),
        }
    }

    /// Everything written so far, in write order.
    pub fn captured(&self) -> Vec<u8> {
        self.inner.lock().written.clone()
    }

    pub fn started(&self) -> bool {
        self.inner.lock().started
    }

    pub fn start_count(&self) -> u32 {
        self.inner.lock().start_count
    }

    pub fn stop_count(&self) -> u32 {
        self.inner.lock().stop_count
    }
}

impl OutputDevice for LoopbackDevice {
    fn format(&self) -> SampleFormat {
        self.format
    }

    fn buffer_frames(&self) -> usize {
        self.buffer_frames
    }

    fn current_padding(&self) -> Result<usize> {
        // drains instantly: each wait cycle sees an empty buffer
        let mut inner = self.inner.lock();
        inner.queued_frames = 0;
        Ok(0)
    }

    fn write(&mut self, data: &[u8], frames: usize) -> Result<()> {
        let bytes = self.format.frames_to_bytes(frames);
        let mut inner = self.inner.lock();
        inner.written.extend_from_slice(&data[..bytes]);
        inner.queued_frames += frames;
        Ok(())
    }

    fn write_silence(&mut self, frames: usize) -> Result<()> {
        let bytes = self.format.frames_to_bytes(frames);
        let mut inner = self.inner.lock();
        inner.written.extend(std::iter::repeat(0u8).take(bytes));
        inner.queued_frames += frames;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.started = true;
        inner.start_count += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.started = false;
        inner.stop_count += 1;
        Ok(())
    }

    fn wait_buffer_ready(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(true)
    }
}
