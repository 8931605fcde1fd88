pub mod analysis;
pub mod loader;
pub mod playback;
pub mod tap;

pub use analysis::{
    compute_descriptors, compute_envelope, suggest_preset, Descriptors, Preset,
    DEFAULT_ENVELOPE_POINTS,
};
pub use loader::{decode_bytes, AudioLoader, Source};
pub use playback::{AudioOutput, OutputVoice, PlaybackController, PlaybackState, RodioOutput};
pub use tap::{AnalysisTap, TAP_WINDOW_SIZE};

/// Decoded multi-channel PCM audio.
///
/// Samples are stored as per-channel planes of amplitudes in [-1, 1].
/// Immutable once produced; a new source load replaces the whole buffer.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl PcmBuffer {
    /// Builds a buffer from per-channel sample planes.
    ///
    /// All planes are expected to have the same length; the first channel
    /// defines the frame count.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// Builds a buffer by de-interleaving frame-major samples.
    /// A trailing partial frame, if any, is dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Self {
        let channel_count = channel_count.max(1);
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (plane, &sample) in channels.iter_mut().zip(frame) {
                plane.push(sample);
            }
        }
        Self {
            channels,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// The first channel, or an empty slice for a channel-less buffer.
    /// Analysis and the live tap both read this plane.
    pub fn first_channel(&self) -> &[f32] {
        self.channel(0).unwrap_or(&[])
    }

    /// Re-interleaves the planes into frame-major order for playback.
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frame_count();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for frame in 0..frames {
            for plane in &self.channels {
                out.push(plane.get(frame).copied().unwrap_or(0.0));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deinterleaves_stereo_frames() {
        let buffer = PcmBuffer::from_interleaved(&[0.1, -0.1, 0.2, -0.2, 0.3], 2, 48000);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.1, 0.2]);
        assert_eq!(buffer.channel(1).unwrap(), &[-0.1, -0.2]);
    }

    #[test]
    fn duration_derives_from_frames_and_rate() {
        let buffer = PcmBuffer::new(vec![vec![0.0; 44100]], 44100);
        assert!((buffer.duration_seconds() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn interleave_round_trips() {
        let buffer = PcmBuffer::new(vec![vec![0.1, 0.2], vec![-0.1, -0.2]], 44100);
        assert_eq!(buffer.interleaved(), vec![0.1, -0.1, 0.2, -0.2]);
    }

    #[test]
    fn empty_buffer_is_harmless() {
        let buffer = PcmBuffer::new(Vec::new(), 44100);
        assert_eq!(buffer.frame_count(), 0);
        assert_eq!(buffer.duration_seconds(), 0.0);
        assert!(buffer.first_channel().is_empty());
    }
}
