//! Pure signal reduction over a decoded buffer: envelope downsampling,
//! scalar descriptors, and the preset heuristic derived from them.

use serde::{Deserialize, Serialize};

use crate::audio::PcmBuffer;

/// Envelope resolution used when the caller does not pick one.
pub const DEFAULT_ENVELOPE_POINTS: usize = 100;

/// Mastering preset suggested from crest factor and zero-crossing rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Trap,
    Lofi,
    Warm,
    Bright,
    Clean,
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Preset::Trap => "trap",
            Preset::Lofi => "lofi",
            Preset::Warm => "warm",
            Preset::Bright => "bright",
            Preset::Clean => "clean",
        };
        f.write_str(name)
    }
}

/// Scalar descriptors extracted from the first channel of a buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptors {
    pub duration_seconds: f64,
    pub channel_count: usize,
    pub sample_rate: u32,
    pub rms: f32,
    pub peak: f32,
    /// Peak over RMS. A silent buffer has no meaningful crest factor; it
    /// is reported as positive infinity rather than NaN.
    pub crest_factor: f32,
    /// Fraction of adjacent-sample sign changes, in [0, 1].
    pub zero_crossing_rate: f32,
    pub suggested_preset: Preset,
}

/// Downsamples the first channel to `points` normalized amplitude values.
///
/// The channel is partitioned into `points` blocks of
/// `floor(frames / points)` samples; a short trailing remainder is
/// dropped. Each block contributes its peak magnitude, and the result is
/// scaled so the loudest block is exactly 1.0. A silent buffer yields all
/// zeros, and when `points` exceeds the frame count the empty blocks
/// stay at zero.
pub fn compute_envelope(buffer: &PcmBuffer, points: usize) -> Vec<f32> {
    if points == 0 {
        return Vec::new();
    }
    let samples = buffer.first_channel();
    let block_size = samples.len() / points;

    let mut envelope = Vec::with_capacity(points);
    for i in 0..points {
        let start = i * block_size;
        let block = &samples[start..start + block_size];
        let peak = block.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        envelope.push(peak);
    }

    let max = envelope.iter().fold(0.0f32, |a, &b| a.max(b));
    if max > 0.0 {
        for value in &mut envelope {
            *value /= max;
        }
    }
    envelope
}

/// Computes loudness, peak, dynamic-range, and brightness descriptors in
/// two linear passes over the first channel.
pub fn compute_descriptors(buffer: &PcmBuffer) -> Descriptors {
    let samples = buffer.first_channel();

    let mut sum_squares = 0.0f64;
    let mut peak = 0.0f32;
    for &sample in samples {
        sum_squares += f64::from(sample) * f64::from(sample);
        peak = peak.max(sample.abs());
    }
    let rms = if samples.is_empty() {
        0.0
    } else {
        (sum_squares / samples.len() as f64).sqrt() as f32
    };

    let crossings = samples
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    let zero_crossing_rate = if samples.is_empty() {
        0.0
    } else {
        crossings as f32 / samples.len() as f32
    };

    // Silence would make peak/rms a 0/0 NaN. Report the sentinel and fall
    // back to the default preset, since the heuristic has nothing to read.
    let (crest_factor, suggested_preset) = if rms > 0.0 {
        let crest = peak / rms;
        (crest, suggest_preset(crest, zero_crossing_rate))
    } else {
        (f32::INFINITY, Preset::Clean)
    };

    Descriptors {
        duration_seconds: buffer.duration_seconds(),
        channel_count: buffer.channel_count(),
        sample_rate: buffer.sample_rate(),
        rms,
        peak,
        crest_factor,
        zero_crossing_rate,
        suggested_preset,
    }
}

/// Ordered first-match preset heuristic. Approximate by nature, but
/// reproducible for identical input.
pub fn suggest_preset(crest_factor: f32, zero_crossing_rate: f32) -> Preset {
    if crest_factor < 4.0 {
        // Heavily compressed material; split on spectral brightness.
        if zero_crossing_rate < 0.1 {
            Preset::Trap
        } else {
            Preset::Lofi
        }
    } else if crest_factor > 10.0 {
        Preset::Warm
    } else if zero_crossing_rate > 0.15 {
        Preset::Bright
    } else {
        Preset::Clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(samples: Vec<f32>) -> PcmBuffer {
        PcmBuffer::new(vec![samples], 44100)
    }

    fn sine(frequency: f32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / 44100.0).sin())
            .collect()
    }

    #[test]
    fn envelope_has_requested_resolution_and_unit_peak() {
        let buffer = mono(sine(440.0, 44100));
        let envelope = compute_envelope(&buffer, 100);
        assert_eq!(envelope.len(), 100);
        assert!(envelope.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(envelope.iter().any(|&v| v == 1.0));
    }

    #[test]
    fn envelope_of_silence_is_all_zeros() {
        let envelope = compute_envelope(&mono(vec![0.0; 10_000]), 100);
        assert_eq!(envelope.len(), 100);
        assert!(envelope.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn envelope_survives_more_points_than_frames() {
        let envelope = compute_envelope(&mono(vec![0.5; 10]), 100);
        assert_eq!(envelope.len(), 100);
        assert!(envelope.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn envelope_drops_trailing_remainder() {
        // 1050 frames at 100 points leaves a 50-sample tail that must not
        // leak into any block.
        let mut samples = vec![0.0; 1050];
        samples[1049] = 1.0;
        let envelope = compute_envelope(&mono(samples), 100);
        assert!(envelope.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn descriptors_of_square_wave() {
        let n = 1000usize;
        let samples: Vec<f32> = (0..n).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let descriptors = compute_descriptors(&mono(samples));
        assert!((descriptors.rms - 1.0).abs() < 1e-6);
        assert_eq!(descriptors.peak, 1.0);
        let expected_zcr = (n - 1) as f32 / n as f32;
        assert!((descriptors.zero_crossing_rate - expected_zcr).abs() < 1e-6);
    }

    #[test]
    fn silent_buffer_has_sentinel_crest_factor() {
        let descriptors = compute_descriptors(&mono(vec![0.0; 4410]));
        assert_eq!(descriptors.rms, 0.0);
        assert!(descriptors.crest_factor.is_infinite());
        assert!(!descriptors.crest_factor.is_nan());
        assert_eq!(descriptors.suggested_preset, Preset::Clean);
    }

    #[test]
    fn sine_reads_as_compressed_low_frequency() {
        // A pure sine has crest factor sqrt(2) and a low crossing rate.
        let descriptors = compute_descriptors(&mono(sine(440.0, 44100)));
        assert!((descriptors.crest_factor - std::f32::consts::SQRT_2).abs() < 0.01);
        assert_eq!(descriptors.suggested_preset, Preset::Trap);
    }

    #[test]
    fn preset_heuristic_is_ordered_first_match() {
        assert_eq!(suggest_preset(3.0, 0.05), Preset::Trap);
        assert_eq!(suggest_preset(3.0, 0.2), Preset::Lofi);
        assert_eq!(suggest_preset(12.0, 0.05), Preset::Warm);
        assert_eq!(suggest_preset(12.0, 0.15), Preset::Warm);
        assert_eq!(suggest_preset(6.0, 0.2), Preset::Bright);
        assert_eq!(suggest_preset(6.0, 0.05), Preset::Clean);
    }

    #[test]
    fn empty_buffer_descriptors_are_defined() {
        let descriptors = compute_descriptors(&mono(Vec::new()));
        assert_eq!(descriptors.rms, 0.0);
        assert_eq!(descriptors.peak, 0.0);
        assert_eq!(descriptors.zero_crossing_rate, 0.0);
        assert!(descriptors.crest_factor.is_infinite());
    }
}
