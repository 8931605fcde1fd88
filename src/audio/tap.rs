//! Live analysis tap: byte-scaled frequency and time-domain reads over a
//! fixed 2048-sample window at the current playhead.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Transform window size in samples. Snapshots read this many samples
/// starting at the playhead, zero-padded past the end of the buffer.
pub const TAP_WINDOW_SIZE: usize = 2048;

// Decibel range the byte scale covers: magnitudes at or below the floor
// map to 0, at or above the ceiling to 255.
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

pub struct AnalysisTap {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl AnalysisTap {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(TAP_WINDOW_SIZE);
        Self {
            fft,
            window: hann_window(TAP_WINDOW_SIZE),
        }
    }

    /// Number of spectral magnitude bins a frequency snapshot yields.
    pub fn bin_count(&self) -> usize {
        TAP_WINDOW_SIZE / 2
    }

    /// Spectral magnitudes of the window starting at `offset`, scaled to
    /// bytes over the [-100 dB, -30 dB] range.
    pub fn frequency_bytes(&self, samples: &[f32], offset: usize) -> Vec<u8> {
        let mut buffer: Vec<Complex<f32>> = (0..TAP_WINDOW_SIZE)
            .map(|i| {
                let sample = samples.get(offset + i).copied().unwrap_or(0.0);
                Complex::new(sample * self.window[i], 0.0)
            })
            .collect();
        self.fft.process(&mut buffer);

        buffer[..self.bin_count()]
            .iter()
            .map(|bin| {
                let magnitude = bin.norm() * 2.0 / TAP_WINDOW_SIZE as f32;
                let db = 20.0 * magnitude.max(f32::MIN_POSITIVE).log10();
                let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
                (scaled.clamp(0.0, 1.0) * 255.0).round() as u8
            })
            .collect()
    }

    /// Raw amplitudes of the window starting at `offset`, scaled to bytes
    /// with silence centered at 128.
    pub fn time_domain_bytes(&self, samples: &[f32], offset: usize) -> Vec<u8> {
        (0..TAP_WINDOW_SIZE)
            .map(|i| {
                let sample = samples.get(offset + i).copied().unwrap_or(0.0);
                (((sample.clamp(-1.0, 1.0) + 1.0) / 2.0) * 255.0).round() as u8
            })
            .collect()
    }
}

impl Default for AnalysisTap {
    fn default() -> Self {
        Self::new()
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}
