//! Single-session playback: one buffer, one live voice, and on-demand
//! snapshots from the analysis tap at the current playhead.

use std::time::Instant;

use log::{info, warn};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::audio::tap::{AnalysisTap, TAP_WINDOW_SIZE};
use crate::audio::PcmBuffer;
use crate::error::AudioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Seam over the real-time audio graph: turns a PCM buffer into a live
/// output voice. Tests substitute a mock; production uses [`RodioOutput`].
pub trait AudioOutput {
    type Voice: OutputVoice;

    fn start(&self, buffer: &PcmBuffer) -> Result<Self::Voice, AudioError>;
}

/// A sound-producing node. At most one is live per controller.
pub trait OutputVoice {
    /// Halts output. Must be safe to call more than once.
    fn stop(&mut self);

    /// True once the voice has played its buffer to the end.
    fn is_finished(&self) -> bool;
}

/// Default output backed by the platform audio device.
pub struct RodioOutput {
    // Dropping the stream kills the device connection, so it is held for
    // the lifetime of the output even though only the handle is used.
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioOutput {
    /// Opens the default output device. Platforms that start audio in a
    /// suspended state are activated here, before any playback.
    pub fn new() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl AudioOutput for RodioOutput {
    type Voice = RodioVoice;

    fn start(&self, buffer: &PcmBuffer) -> Result<RodioVoice, AudioError> {
        let sink = Sink::try_new(&self.handle)?;
        sink.append(SamplesBuffer::new(
            buffer.channel_count().max(1) as u16,
            buffer.sample_rate(),
            buffer.interleaved(),
        ));
        sink.play();
        Ok(RodioVoice { sink })
    }
}

pub struct RodioVoice {
    sink: Sink,
}

impl OutputVoice for RodioVoice {
    fn stop(&mut self) {
        self.sink.stop();
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}

/// Manages one playback session over the loaded buffer.
///
/// States are `Idle` and `Playing` only; there is no pause. Starting a new
/// session tears the previous voice down first, and natural completion is
/// observed as a transition back to `Idle` the next time state is read.
pub struct PlaybackController<O: AudioOutput> {
    output: O,
    buffer: Option<PcmBuffer>,
    tap: Option<AnalysisTap>,
    voice: Option<O::Voice>,
    started_at: Option<Instant>,
}

impl<O: AudioOutput> PlaybackController<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            buffer: None,
            tap: None,
            voice: None,
            started_at: None,
        }
    }

    /// Replaces the held buffer and rebuilds the analysis tap.
    ///
    /// An in-progress session keeps playing the old audio; callers that
    /// want the session and the buffer to agree stop playback first.
    pub fn set_buffer(&mut self, buffer: PcmBuffer) {
        if self.voice.is_some() {
            warn!("buffer replaced while a session is active");
        }
        self.tap = Some(AnalysisTap::new());
        self.buffer = Some(buffer);
    }

    pub fn buffer(&self) -> Option<&PcmBuffer> {
        self.buffer.as_ref()
    }

    /// Starts playback from time zero, tearing down any live voice.
    pub fn play(&mut self) -> Result<(), AudioError> {
        let buffer = self.buffer.as_ref().ok_or(AudioError::NoBuffer)?;
        if let Some(mut voice) = self.voice.take() {
            voice.stop();
        }
        let voice = self.output.start(buffer)?;
        self.voice = Some(voice);
        self.started_at = Some(Instant::now());
        info!("playback started ({:.2}s)", buffer.duration_seconds());
        Ok(())
    }

    /// Halts playback and releases the voice. No-op when idle.
    pub fn stop(&mut self) {
        if let Some(mut voice) = self.voice.take() {
            voice.stop();
            info!("playback stopped");
        }
        self.started_at = None;
    }

    pub fn state(&mut self) -> PlaybackState {
        self.settle();
        if self.voice.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    pub fn is_playing(&mut self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Playhead in seconds from the monotonic clock, clamped to the buffer
    /// duration. `None` when idle.
    pub fn position_seconds(&mut self) -> Option<f64> {
        self.settle();
        let duration = self.buffer.as_ref()?.duration_seconds();
        let started = self.started_at?;
        Some(started.elapsed().as_secs_f64().min(duration))
    }

    /// Byte-scaled spectral magnitudes at the playhead, or `None` when no
    /// tap exists. Unavailability is not an error.
    pub fn frequency_snapshot(&mut self) -> Option<Vec<u8>> {
        self.settle();
        let buffer = self.buffer.as_ref()?;
        let offset = playhead_frame(self.started_at, buffer);
        let tap = self.tap.as_ref()?;
        Some(tap.frequency_bytes(buffer.first_channel(), offset))
    }

    /// Byte-scaled time-domain samples at the playhead, or `None` when no
    /// tap exists.
    pub fn time_domain_snapshot(&mut self) -> Option<Vec<u8>> {
        self.settle();
        let buffer = self.buffer.as_ref()?;
        let offset = playhead_frame(self.started_at, buffer);
        let tap = self.tap.as_ref()?;
        Some(tap.time_domain_bytes(buffer.first_channel(), offset))
    }

    // Natural completion: a finished voice is released and the session
    // returns to idle the next time anything observes state.
    fn settle(&mut self) {
        let finished = self.voice.as_ref().map_or(false, |voice| voice.is_finished());
        if finished {
            self.voice = None;
            self.started_at = None;
            info!("playback finished");
        }
    }
}

/// Frame index of the playhead, pinned so a full tap window fits. Idle
/// sessions read from the start of the buffer.
fn playhead_frame(started_at: Option<Instant>, buffer: &PcmBuffer) -> usize {
    match started_at {
        Some(started) => {
            let frame = (started.elapsed().as_secs_f64() * buffer.sample_rate() as f64) as usize;
            frame.min(buffer.frame_count().saturating_sub(TAP_WINDOW_SIZE))
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockOutput {
        live: Arc<AtomicUsize>,
        starts: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
    }

    struct MockVoice {
        live: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
        stopped: bool,
    }

    impl AudioOutput for MockOutput {
        type Voice = MockVoice;

        fn start(&self, _buffer: &PcmBuffer) -> Result<MockVoice, AudioError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(MockVoice {
                live: Arc::clone(&self.live),
                finished: Arc::clone(&self.finished),
                stopped: false,
            })
        }
    }

    impl OutputVoice for MockVoice {
        fn stop(&mut self) {
            if !self.stopped {
                self.stopped = true;
                self.live.fetch_sub(1, Ordering::SeqCst);
            }
        }

        fn is_finished(&self) -> bool {
            self.finished.load(Ordering::SeqCst)
        }
    }

    struct Harness {
        controller: PlaybackController<MockOutput>,
        live: Arc<AtomicUsize>,
        starts: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
    }

    fn harness() -> Harness {
        let live = Arc::new(AtomicUsize::new(0));
        let starts = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let output = MockOutput {
            live: Arc::clone(&live),
            starts: Arc::clone(&starts),
            finished: Arc::clone(&finished),
        };
        Harness {
            controller: PlaybackController::new(output),
            live,
            starts,
            finished,
        }
    }

    fn test_buffer() -> PcmBuffer {
        PcmBuffer::new(vec![vec![0.5; 44100]], 44100)
    }

    #[test]
    fn play_without_buffer_fails() {
        let mut h = harness();
        assert!(matches!(h.controller.play(), Err(AudioError::NoBuffer)));
        assert_eq!(h.controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn double_play_keeps_one_live_voice() {
        let mut h = harness();
        h.controller.set_buffer(test_buffer());
        h.controller.play().unwrap();
        h.controller.play().unwrap();
        assert_eq!(h.starts.load(Ordering::SeqCst), 2);
        assert_eq!(h.live.load(Ordering::SeqCst), 1);
        assert!(h.controller.is_playing());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut h = harness();
        h.controller.stop();
        h.controller.stop();
        assert_eq!(h.controller.state(), PlaybackState::Idle);

        h.controller.set_buffer(test_buffer());
        h.controller.play().unwrap();
        h.controller.stop();
        h.controller.stop();
        assert_eq!(h.live.load(Ordering::SeqCst), 0);
        assert!(h.controller.position_seconds().is_none());
    }

    #[test]
    fn natural_completion_returns_to_idle() {
        let mut h = harness();
        h.controller.set_buffer(test_buffer());
        h.controller.play().unwrap();
        assert!(h.controller.is_playing());

        h.finished.store(true, Ordering::SeqCst);
        assert!(!h.controller.is_playing());
        assert_eq!(h.controller.state(), PlaybackState::Idle);
        assert!(h.controller.position_seconds().is_none());
    }

    #[test]
    fn snapshots_unavailable_without_buffer() {
        let mut h = harness();
        assert!(h.controller.frequency_snapshot().is_none());
        assert!(h.controller.time_domain_snapshot().is_none());
    }

    #[test]
    fn snapshots_available_once_loaded() {
        let mut h = harness();
        h.controller.set_buffer(test_buffer());
        let spectrum = h.controller.frequency_snapshot().unwrap();
        assert_eq!(spectrum.len(), TAP_WINDOW_SIZE / 2);
        let wave = h.controller.time_domain_snapshot().unwrap();
        assert_eq!(wave.len(), TAP_WINDOW_SIZE);
        // 0.5 amplitude sits between silence (128) and full scale.
        assert!(wave.iter().all(|&b| b == 191));
    }

    #[test]
    fn position_tracks_the_clock_while_playing() {
        let mut h = harness();
        h.controller.set_buffer(test_buffer());
        h.controller.play().unwrap();
        let position = h.controller.position_seconds().unwrap();
        assert!(position >= 0.0);
        assert!(position <= 1.0);
    }
}
