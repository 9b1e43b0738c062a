//! Refill driver for the callback-style planar transport

use tracing::{debug, warn};

use super::{source_bytes_for, EventSink, PlaybackState, SharedState};
use crate::convert::{PlanarConverter, DSD_IDLE};
use crate::error::Result;
use crate::format::SampleFormat;
use crate::source::SampleSource;

/// Fills per-channel device buffer regions from inside a driver callback.
///
/// The callback context cannot block, allocate or tear the stream down, so
/// the scratch buffer is sized once at construction and producer exhaustion
/// is reported as a `StopRequested` event for the owner to act on outside
/// the callback.
pub struct PlanarStream {
    source: Box<dyn SampleSource>,
    converter: PlanarConverter,
    source_format: SampleFormat,
    device_format: SampleFormat,
    state: SharedState,
    events: EventSink,
    scratch: Vec<u8>,
    frames_per_fill: usize,
    pad_byte: u8,
    stop_requested: bool,
}

impl PlanarStream {
    /// Build a stream for an opened device. `frames_per_fill` is the fixed
    /// per-channel frame count the driver hands out each callback.
    pub fn new(
        source: Box<dyn SampleSource>,
        device_format: SampleFormat,
        frames_per_fill: usize,
        events: EventSink,
    ) -> Result<Self> {
        let source_format = source.format();
        source_format.validate()?;
        device_format.validate()?;
        let converter = PlanarConverter::select(&source_format, &device_format)?;
        let pad_byte = if converter.consumes_dsd() { DSD_IDLE } else { 0 };
        let scratch = vec![pad_byte; source_bytes_for(frames_per_fill, &source_format, &device_format)];
        debug!(
            source = %source_format,
            device = %device_format,
            frames = frames_per_fill,
            "planar stream ready"
        );
        Ok(Self {
            source,
            converter,
            source_format,
            device_format,
            state: SharedState::new(PlaybackState::Stopped),
            events,
            scratch,
            frames_per_fill,
            pad_byte,
            stop_requested: false,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state.get()
    }

    /// State handle for control glue running on another thread.
    pub fn shared_state(&self) -> SharedState {
        self.state.clone()
    }

    pub fn play(&mut self) {
        if self.state.get() == PlaybackState::Stopped {
            self.stop_requested = false;
            self.events.rearm();
        }
        self.state.set(PlaybackState::Playing);
    }

    pub fn pause(&mut self) {
        if self.state.get() == PlaybackState::Playing {
            self.state.set(PlaybackState::Paused);
        }
    }

    /// Transition to Stopped and emit the Stopped event once.
    pub fn stop(&mut self) {
        self.state.set(PlaybackState::Stopped);
        self.events.emit_stopped(None);
    }

    /// Refill one callback cycle: one destination region per output channel,
    /// `frames` frames each. Every destination byte is written on every call
    /// regardless of state; only Playing consumes the producer.
    pub fn fill(&mut self, outputs: &mut [&mut [u8]], frames: usize) {
        let frames = frames.min(self.frames_per_fill);
        let needed = source_bytes_for(frames, &self.source_format, &self.device_format);

        if self.state.get() == PlaybackState::Playing {
            let got = match self.source.read(&mut self.scratch[..needed]) {
                Ok(n) => n,
                Err(e) => {
                    warn!("producer read failed, substituting silence: {e}");
                    0
                }
            };
            if got < needed {
                self.scratch[got..needed].fill(self.pad_byte);
                if got == 0 && !self.stop_requested {
                    self.stop_requested = true;
                    self.events.request_stop();
                }
            }
        } else {
            self.scratch[..needed].fill(self.pad_byte);
        }

        self.converter.convert(
            &self.scratch[..needed],
            outputs,
            usize::from(self.source_format.channels),
            frames,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::stream::StreamEvent;
    use crossbeam_channel::unbounded;

    fn i32_of(bytes: &[u8]) -> Vec<i32> {
        bytes
            .chunks(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn stream_over(data: Vec<u8>) -> (PlanarStream, crossbeam_channel::Receiver<StreamEvent>) {
        let (tx, rx) = unbounded();
        let source = MemorySource::new(SampleFormat::pcm(44100, 16, 2), data);
        let stream = PlanarStream::new(
            Box::new(source),
            SampleFormat::pcm(44100, 32, 2),
            2,
            EventSink::new(tx),
        )
        .unwrap();
        (stream, rx)
    }

    fn i16_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_fill_converts_while_playing() {
        let (mut stream, _rx) = stream_over(i16_bytes(&[100, -100, 200, -200]));
        stream.play();
        let mut left = [0u8; 8];
        let mut right = [0u8; 8];
        {
            let mut outputs: [&mut [u8]; 2] = [&mut left, &mut right];
            stream.fill(&mut outputs, 2);
        }
        assert_eq!(i32_of(&left), [100 << 16, 200 << 16]);
        assert_eq!(i32_of(&right), [-100 << 16, -200 << 16]);
    }

    #[test]
    fn test_paused_writes_silence_without_consuming() {
        let (mut stream, _rx) = stream_over(i16_bytes(&[100, -100, 200, -200]));
        stream.play();
        stream.pause();
        let mut left = [0xFFu8; 8];
        let mut right = [0xFFu8; 8];
        {
            let mut outputs: [&mut [u8]; 2] = [&mut left, &mut right];
            stream.fill(&mut outputs, 2);
        }
        assert_eq!(left, [0; 8]);
        assert_eq!(right, [0; 8]);

        // resume picks up from the first sample
        stream.play();
        {
            let mut outputs: [&mut [u8]; 2] = [&mut left, &mut right];
            stream.fill(&mut outputs, 2);
        }
        assert_eq!(i32_of(&left), [100 << 16, 200 << 16]);
    }

    #[test]
    fn test_short_read_pads_and_exhaustion_requests_stop_once() {
        // one and a half fills worth of data
        let (mut stream, rx) = stream_over(i16_bytes(&[1, 2, 3, 4, 5, 6]));
        stream.play();
        let mut left = [0u8; 8];
        let mut right = [0u8; 8];
        {
            let mut outputs: [&mut [u8]; 2] = [&mut left, &mut right];
            stream.fill(&mut outputs, 2);
        }
        // second fill: one real frame, one padded frame
        {
            let mut outputs: [&mut [u8]; 2] = [&mut left, &mut right];
            stream.fill(&mut outputs, 2);
        }
        assert_eq!(i32_of(&left), [5 << 16, 0]);
        assert!(rx.try_recv().is_err());

        // third and fourth fills: fully exhausted, stop requested exactly once
        for _ in 0..2 {
            let mut outputs: [&mut [u8]; 2] = [&mut left, &mut right];
            stream.fill(&mut outputs, 2);
        }
        assert_eq!(rx.try_recv().unwrap(), StreamEvent::StopRequested);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stop_emits_stopped_once() {
        let (mut stream, rx) = stream_over(vec![]);
        stream.play();
        stream.stop();
        stream.stop();
        assert_eq!(rx.try_recv().unwrap(), StreamEvent::Stopped { error: None });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dsd_stream_pads_with_idle() {
        let (tx, _rx) = unbounded();
        let source = MemorySource::new(SampleFormat::dsd(2_822_400, 2), vec![0x11, 0x22]);
        let mut stream = PlanarStream::new(
            Box::new(source),
            SampleFormat::dop(176_400, 24, 2),
            2,
            EventSink::new(tx),
        )
        .unwrap();
        stream.play();
        let mut left = [0u8; 6];
        let mut right = [0u8; 6];
        {
            let mut outputs: [&mut [u8]; 2] = [&mut left, &mut right];
            stream.fill(&mut outputs, 2);
        }
        // first payload pair is real, second pair is idle padding
        assert_eq!(left, [DSD_IDLE, 0x11, 0x05, DSD_IDLE, DSD_IDLE, 0xFA]);
        assert_eq!(right, [DSD_IDLE, 0x22, 0x05, DSD_IDLE, DSD_IDLE, 0xFA]);
    }

    #[test]
    fn test_producer_error_substitutes_silence() {
        struct FailingSource(SampleFormat);
        impl SampleSource for FailingSource {
            fn format(&self) -> SampleFormat {
                self.0
            }
            fn read(&mut self, _buf: &mut [u8]) -> crate::error::Result<usize> {
                Err(crate::error::Error::source("transient"))
            }
        }

        let (tx, _rx) = unbounded();
        let mut stream = PlanarStream::new(
            Box::new(FailingSource(SampleFormat::pcm(44100, 16, 2))),
            SampleFormat::pcm(44100, 32, 2),
            2,
            EventSink::new(tx),
        )
        .unwrap();
        stream.play();
        let mut left = [0xFFu8; 8];
        let mut right = [0xFFu8; 8];
        {
            let mut outputs: [&mut [u8]; 2] = [&mut left, &mut right];
            stream.fill(&mut outputs, 2);
        }
        assert_eq!(left, [0; 8]);
        assert_eq!(stream.state(), PlaybackState::Playing);
    }
}
