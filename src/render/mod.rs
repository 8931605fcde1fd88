pub mod pixmap;
pub mod waveform;

pub use pixmap::{Color, Pixmap};
pub use waveform::{WaveformRenderer, WaveformStyle};
