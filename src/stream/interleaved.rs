//! Refill thread driving an interleaved output device

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use super::{source_bytes_for, EventSink, PlaybackState, SharedState};
use crate::config::PipeConfig;
use crate::convert::{InterleavedConverter, DSD_IDLE};
use crate::device::OutputDevice;
use crate::error::Result;
use crate::format::{SampleEncoding, SampleFormat};
use crate::priority::{self, PriorityBackend, PriorityClass};
use crate::source::SampleSource;

/// Playback driver for the shared-buffer interleaved transport.
///
/// Owns a refill thread spawned on the first `play`. The thread prefills the
/// device buffer, starts the device and then cycles: wait for buffer space,
/// top the buffer up while Playing, keep it silent while Paused, exit when
/// the producer runs dry or `stop` is called. The Stopped event is emitted
/// from the thread exit path exactly once per lifecycle.
pub struct InterleavedStream {
    state: SharedState,
    events: EventSink,
    worker: Option<Worker>,
    handle: Option<JoinHandle<()>>,
}

impl InterleavedStream {
    pub fn new(
        source: Box<dyn SampleSource>,
        device: Box<dyn OutputDevice>,
        config: &PipeConfig,
        events: EventSink,
        priority: Arc<dyn PriorityBackend>,
    ) -> Result<Self> {
        let source_format = source.format();
        let device_format = device.format();
        source_format.validate()?;
        device_format.validate()?;
        let converter = InterleavedConverter::select(&source_format, &device_format)?;
        let pad_byte = if converter.consumes_dsd() { DSD_IDLE } else { 0 };

        let buffer_frames = device.buffer_frames();
        let scratch = vec![pad_byte; source_bytes_for(buffer_frames, &source_format, &device_format)];
        let staging = vec![0u8; device_format.frames_to_bytes(buffer_frames)];
        let state = SharedState::new(PlaybackState::Stopped);
        debug!(
            source = %source_format,
            device = %device_format,
            buffer_frames,
            "interleaved stream ready"
        );
        Ok(Self {
            state: state.clone(),
            events: events.clone(),
            worker: Some(Worker {
                source,
                device,
                converter,
                source_format,
                device_format,
                state,
                events,
                latency: Duration::from_millis(u64::from(config.latency_ms)),
                event_sync: config.event_sync,
                refill_threshold: config.refill_threshold,
                priority,
                scratch,
                staging,
                pad_byte,
            }),
            handle: None,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state.get()
    }

    /// Start or resume playback. The first call spawns the refill thread; a
    /// call while Paused just resumes it.
    pub fn play(&mut self) -> Result<()> {
        match self.state.get() {
            PlaybackState::Playing => Ok(()),
            PlaybackState::Paused => {
                self.state.set(PlaybackState::Playing);
                Ok(())
            }
            PlaybackState::Stopped => {
                let worker = self.worker.take().ok_or_else(|| {
                    crate::error::Error::InvalidState(
                        "playback already completed on this stream".to_string(),
                    )
                })?;
                self.events.rearm();
                self.state.set(PlaybackState::Playing);
                let handle = std::thread::Builder::new()
                    .name("dacpipe-render".to_string())
                    .spawn(move || worker.run())
                    .map_err(|e| crate::error::Error::device(e.to_string()))?;
                self.handle = Some(handle);
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state.get() == PlaybackState::Playing {
            self.state.set(PlaybackState::Paused);
        }
    }

    /// Request stop and join the refill thread.
    pub fn stop(&mut self) {
        self.state.set(PlaybackState::Stopped);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InterleavedStream {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    source: Box<dyn SampleSource>,
    device: Box<dyn OutputDevice>,
    converter: InterleavedConverter,
    source_format: SampleFormat,
    device_format: SampleFormat,
    state: SharedState,
    events: EventSink,
    latency: Duration,
    event_sync: bool,
    refill_threshold: usize,
    priority: Arc<dyn PriorityBackend>,
    scratch: Vec<u8>,
    staging: Vec<u8>,
    pad_byte: u8,
}

impl Worker {
    fn run(mut self) {
        let _guard = priority::elevate(self.priority.clone(), PriorityClass::ProAudio);
        let error = match self.run_loop() {
            Ok(()) => None,
            Err(e) => {
                warn!("playback thread failed: {e}");
                Some(e.to_string())
            }
        };
        // device may already be stopped; teardown failures are not reportable
        if let Err(e) = self.device.stop() {
            debug!("device stop during teardown: {e}");
        }
        self.state.set(PlaybackState::Stopped);
        self.events.emit_stopped(error);
    }

    fn run_loop(&mut self) -> Result<()> {
        let buffer_frames = self.device.buffer_frames();

        // prefill the whole buffer before starting the clock
        let mut exhausted = self.fill_buffer(buffer_frames)?;
        self.device.start()?;

        loop {
            if self.state.get() == PlaybackState::Stopped {
                return Ok(());
            }
            if exhausted {
                // let the queued tail play out before stopping the device
                std::thread::sleep(self.latency);
                return Ok(());
            }
            if self.event_sync {
                if !self.device.wait_buffer_ready(self.latency * 2)? {
                    warn!("device buffer signal timed out");
                }
            } else {
                std::thread::sleep(self.latency / 2);
            }

            match self.state.get() {
                PlaybackState::Stopped => return Ok(()),
                PlaybackState::Paused => {
                    let free = buffer_frames.saturating_sub(self.device.current_padding()?);
                    if free > self.refill_threshold {
                        self.device.write_silence(free)?;
                    }
                }
                PlaybackState::Playing => {
                    let free = buffer_frames.saturating_sub(self.device.current_padding()?);
                    if free > self.refill_threshold {
                        exhausted = self.fill_buffer(free)?;
                    }
                }
            }
        }
    }

    /// Convert and queue up to `frames` frames, padding a short producer
    /// read. Returns true when the producer is fully exhausted.
    fn fill_buffer(&mut self, frames: usize) -> Result<bool> {
        // DoP packs sample pairs, keep the frame count even
        let frames = if self.device_format.encoding == SampleEncoding::Dop {
            frames & !1
        } else {
            frames
        };
        if frames == 0 {
            return Ok(false);
        }

        let needed = source_bytes_for(frames, &self.source_format, &self.device_format);
        let got = match self.source.read(&mut self.scratch[..needed]) {
            Ok(n) => n,
            Err(e) => {
                warn!("producer read failed, substituting silence: {e}");
                0
            }
        };
        if got < needed {
            self.scratch[got..needed].fill(self.pad_byte);
        }

        let bytes = self.device_format.frames_to_bytes(frames);
        self.converter.convert(
            &self.scratch[..needed],
            &mut self.staging[..bytes],
            usize::from(self.source_format.channels),
            usize::from(self.device_format.channels),
            frames,
        );
        self.device.write(&self.staging[..bytes], frames)?;
        Ok(got == 0)
    }
}
