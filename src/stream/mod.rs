//! Playback stream drivers
//!
//! One driver per transport family: `PlanarStream` fills per-channel device
//! regions from inside a driver callback, `InterleavedStream` owns a refill
//! thread that feeds an `OutputDevice`. Both share the playback state
//! machine and the event dispatch below.

mod interleaved;
mod planar;

pub use interleaved::InterleavedStream;
pub use planar::PlanarStream;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::trace;

use crate::format::{SampleEncoding, SampleFormat};

/// Playback lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Playing,
            2 => Self::Paused,
            _ => Self::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Stopped => 0,
            Self::Playing => 1,
            Self::Paused => 2,
        }
    }
}

/// Playback state shared between the control side and the refill side.
#[derive(Clone)]
pub struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub fn new(state: PlaybackState) -> Self {
        Self(Arc::new(AtomicU8::new(state.as_u8())))
    }

    pub fn get(&self) -> PlaybackState {
        PlaybackState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: PlaybackState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

/// Notifications delivered to the stream owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The producer is exhausted and the owner should stop the stream. Sent
    /// by the callback-driven transport, which cannot tear itself down from
    /// inside the driver callback.
    StopRequested,
    /// Playback reached the Stopped state. Sent exactly once per playback
    /// lifecycle; `error` carries the failure that ended it, if any.
    Stopped { error: Option<String> },
}

/// Event dispatcher injected by the stream owner.
///
/// Replaces ambient thread-context capture with an explicit channel: events
/// are received wherever the owner drains the channel, never on a thread the
/// stream picked. Sending never blocks and a dropped receiver is ignored.
#[derive(Clone)]
pub struct EventSink {
    sender: Sender<StreamEvent>,
    stopped_sent: Arc<AtomicBool>,
}

impl EventSink {
    pub fn new(sender: Sender<StreamEvent>) -> Self {
        Self {
            sender,
            stopped_sent: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Emit a stop request. Callers guard their own single-shot flag.
    pub fn request_stop(&self) {
        trace!("stop requested");
        let _ = self.sender.try_send(StreamEvent::StopRequested);
    }

    /// Emit the Stopped event. Only the first call per lifecycle sends;
    /// later calls are dropped.
    pub fn emit_stopped(&self, error: Option<String>) {
        if self.stopped_sent.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.sender.try_send(StreamEvent::Stopped { error });
    }

    /// Re-arm the Stopped single-shot for a new playback lifecycle.
    pub fn rearm(&self) {
        self.stopped_sent.store(false, Ordering::Release);
    }
}

/// Source bytes consumed per `frames` device frames for a negotiated pair.
/// PCM and float run frame for frame; each DoP frame carries two DSD payload
/// bytes per source channel; native DSD frames are 1-bit samples, eight per
/// byte per channel.
pub(crate) fn source_bytes_for(
    frames: usize,
    source: &SampleFormat,
    device: &SampleFormat,
) -> usize {
    match device.encoding {
        SampleEncoding::Dop => frames * usize::from(source.channels) * 2,
        SampleEncoding::Dsd => frames / 8 * usize::from(source.channels),
        _ => frames * usize::from(source.block_align()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_shared_state_round_trip() {
        let state = SharedState::new(PlaybackState::Stopped);
        let clone = state.clone();
        state.set(PlaybackState::Playing);
        assert_eq!(clone.get(), PlaybackState::Playing);
        clone.set(PlaybackState::Paused);
        assert_eq!(state.get(), PlaybackState::Paused);
    }

    #[test]
    fn test_stopped_event_is_single_shot() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        sink.emit_stopped(None);
        sink.emit_stopped(Some("late".to_string()));
        assert_eq!(rx.try_recv().unwrap(), StreamEvent::Stopped { error: None });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_rearm_allows_next_lifecycle() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        sink.emit_stopped(None);
        sink.rearm();
        sink.emit_stopped(None);
        assert_eq!(rx.iter().take(2).count(), 2);
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let (tx, rx) = unbounded();
        drop(rx);
        let sink = EventSink::new(tx);
        sink.request_stop();
        sink.emit_stopped(None);
    }

    #[test]
    fn test_source_bytes_per_device_frame() {
        let pcm = SampleFormat::pcm(44100, 16, 2);
        let device = SampleFormat::pcm(44100, 32, 2);
        assert_eq!(source_bytes_for(100, &pcm, &device), 400);

        let dsd = SampleFormat::dsd(2_822_400, 2);
        let dop = SampleFormat::dop(176_400, 24, 2);
        assert_eq!(source_bytes_for(100, &dsd, &dop), 400);
        assert_eq!(source_bytes_for(64, &dsd, &dsd), 16);
    }
}
