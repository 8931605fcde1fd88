//! Bar-waveform renderer: paints an amplitude envelope as a two-tone
//! progress bar graph with a moving playhead cursor.

use std::time::Instant;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::render::pixmap::{Color, Pixmap};

/// Visual configuration, fixed for the lifetime of a renderer instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformStyle {
    pub wave_color: Color,
    pub progress_color: Color,
    pub background: Color,
    pub bar_width: u32,
    pub bar_gap: u32,
    pub bar_radius: f32,
    pub cursor_width: u32,
    pub cursor_color: Color,
    /// Responsive renderers track their hosting container on resize;
    /// fixed ones keep the dimensions given at construction.
    pub responsive: bool,
}

impl Default for WaveformStyle {
    fn default() -> Self {
        Self {
            wave_color: Color::rgb(0x63, 0x66, 0xF1),
            progress_color: Color::rgb(0x10, 0xB9, 0x81),
            background: Color::TRANSPARENT,
            bar_width: 2,
            bar_gap: 1,
            bar_radius: 0.0,
            cursor_width: 2,
            cursor_color: Color::rgba(0, 0, 0, 128),
            responsive: true,
        }
    }
}

/// Owns the drawable surface and the view state painted onto it.
///
/// Redraws happen on data load, on explicit cursor updates while not
/// animating, on resize, and once per [`tick`](Self::tick) while the
/// animation is live. The animation is cooperative: the host calls `tick`
/// once per frame and schedules the next frame only while it returns true,
/// so `pause` cancels synchronously.
pub struct WaveformRenderer {
    surface: Pixmap,
    style: WaveformStyle,
    envelope: Vec<f32>,
    duration: f64,
    current_time: f64,
    // Animation origin: the instant `play` was called and the cursor
    // position at that moment. None means not animating.
    anim_origin: Option<(Instant, f64)>,
    // Cleared by destroy(); resize notifications are ignored after that.
    resize_attached: bool,
}

impl WaveformRenderer {
    pub fn new(width: u32, height: u32, style: WaveformStyle) -> Self {
        let resize_attached = style.responsive;
        let mut renderer = Self {
            surface: Pixmap::new(width, height),
            style,
            envelope: Vec::new(),
            duration: 0.0,
            current_time: 0.0,
            anim_origin: None,
            resize_attached,
        };
        renderer.draw();
        renderer
    }

    pub fn surface(&self) -> &Pixmap {
        &self.surface
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_animating(&self) -> bool {
        self.anim_origin.is_some()
    }

    /// Replaces the envelope and duration, then redraws immediately.
    pub fn load(&mut self, envelope: Vec<f32>, duration: f64) {
        self.envelope = envelope;
        self.duration = duration.max(0.0);
        self.current_time = self.current_time.clamp(0.0, self.duration);
        self.draw();
    }

    /// Moves the cursor, clamped to [0, duration]. Redraws unless the
    /// animation loop is already drawing on its own cadence.
    pub fn set_current_time(&mut self, time: f64) {
        self.current_time = time.clamp(0.0, self.duration);
        if !self.is_animating() {
            self.draw();
        }
    }

    /// Starts the animated "playing" visual mode. Idempotent: a second
    /// call while animating keeps the original origin so motion stays
    /// continuous.
    pub fn play(&mut self, now: Instant) {
        if self.is_animating() {
            return;
        }
        self.anim_origin = Some((now, self.current_time));
        debug!("waveform animation started at {:.2}s", self.current_time);
    }

    /// Advances one animation frame from the wall clock and redraws.
    ///
    /// Returns whether the animation is still live; the host schedules the
    /// next frame only on true. Reaching the duration clamps the cursor
    /// there and stops the animation.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some((started, offset)) = self.anim_origin else {
            return false;
        };
        self.current_time = offset + now.saturating_duration_since(started).as_secs_f64();
        if self.current_time >= self.duration {
            self.current_time = self.duration;
            self.anim_origin = None;
            debug!("waveform animation reached the end");
        }
        self.draw();
        self.is_animating()
    }

    /// Stops the animated visual mode. Idempotent; the cursor keeps its
    /// position and no further ticks have any effect.
    pub fn pause(&mut self) {
        self.anim_origin = None;
    }

    /// Adopts the hosting container's current size and redraws. Ignored
    /// for non-responsive instances.
    pub fn handle_resize(&mut self, container_width: u32, container_height: u32) {
        if !self.resize_attached {
            return;
        }
        self.surface.resize(container_width, container_height);
        self.draw();
    }

    /// Releases the renderer: cancels any animation and detaches from
    /// resize notifications. Idempotent; the surface keeps its last
    /// contents.
    pub fn destroy(&mut self) {
        self.pause();
        self.resize_attached = false;
    }

    /// Repaints the whole surface from the current view state.
    pub fn draw(&mut self) {
        let width = self.surface.width();
        let height = self.surface.height();
        self.surface.clear(self.style.background);
        if self.envelope.is_empty() || width == 0 || height == 0 {
            return;
        }

        let slot = self.style.bar_width + self.style.bar_gap;
        if slot == 0 {
            return;
        }
        let bar_count = ((width / slot) as usize).min(self.envelope.len());
        if bar_count == 0 {
            return;
        }

        let progress = if self.duration > 0.0 {
            self.current_time / self.duration
        } else {
            0.0
        };
        let progress_x = (f64::from(width) * progress).floor() as i32;

        for i in 0..bar_count {
            let x = (i as u32 * slot) as i32;
            // Nearest-by-ratio mapping: bar count and envelope length need
            // not match.
            let index = i * self.envelope.len() / bar_count;
            let value = self.envelope[index];

            let bar_height = (value * height as f32 * 0.9).max(height as f32 * 0.05);
            let bar_height = (bar_height.round() as u32).clamp(1, height);
            let y = ((height - bar_height) / 2) as i32;

            let color = if x < progress_x {
                self.style.progress_color
            } else {
                self.style.wave_color
            };
            if self.style.bar_radius > 0.0 {
                self.surface.fill_rounded_rect(
                    x,
                    y,
                    self.style.bar_width,
                    bar_height,
                    self.style.bar_radius,
                    color,
                );
            } else {
                self.surface
                    .fill_rect(x, y, self.style.bar_width, bar_height, color);
            }
        }

        if self.style.cursor_width > 0 && self.duration > 0.0 {
            let cursor_x = progress_x - (self.style.cursor_width / 2) as i32;
            self.surface.fill_rect(
                cursor_x,
                0,
                self.style.cursor_width,
                height,
                self.style.cursor_color,
            );
        }
    }
}
