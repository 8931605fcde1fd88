//! Client-side audio inspection and visualization engine.
//!
//! The pipeline: a [`Source`] is loaded and decoded into a [`PcmBuffer`],
//! the analyzer reduces it to an envelope plus [`Descriptors`], the
//! [`PlaybackController`] plays it while exposing live tap snapshots, and
//! the [`WaveformRenderer`] paints the envelope as an animated two-tone
//! bar graph synchronized to the playhead.

pub mod audio;
pub mod error;
pub mod render;

pub use audio::{
    compute_descriptors, compute_envelope, suggest_preset, AudioLoader, Descriptors, PcmBuffer,
    PlaybackController, Preset, RodioOutput, Source,
};
pub use error::AudioError;
pub use render::{Color, Pixmap, WaveformRenderer, WaveformStyle};
