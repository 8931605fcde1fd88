//! Turns a remote URL or local file into a decoded [`PcmBuffer`].

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;

use log::info;
use rodio::{Decoder, Source as RodioSource};

use crate::audio::PcmBuffer;
use crate::error::AudioError;

/// Where the audio bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// Classifies a raw string as a URL or a file path.
    pub fn parse(raw: &str) -> Result<Self, AudioError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AudioError::Source("empty source".into()));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Ok(Source::Url(trimmed.to_string()))
        } else {
            Ok(Source::File(PathBuf::from(trimmed)))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Retrieves and decodes audio sources. Holds the HTTP client so repeated
/// loads reuse its connection pool.
pub struct AudioLoader {
    client: reqwest::Client,
}

impl AudioLoader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetches the source bytes and decodes them into a PCM buffer.
    ///
    /// Single completion, no retries; network, read, and decode failures
    /// each surface as their own [`AudioError`] kind.
    pub async fn load(&self, source: &Source) -> Result<PcmBuffer, AudioError> {
        let bytes = match source {
            Source::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(|e| AudioError::Fetch {
                        url: url.clone(),
                        source: e,
                    })?;
                response
                    .bytes()
                    .await
                    .map_err(|e| AudioError::Fetch {
                        url: url.clone(),
                        source: e,
                    })?
                    .to_vec()
            }
            Source::File(path) => {
                tokio::fs::read(path).await.map_err(|e| AudioError::Read {
                    path: path.clone(),
                    source: e,
                })?
            }
        };
        info!("retrieved {} bytes from {}", bytes.len(), source);
        decode_bytes(bytes)
    }
}

impl Default for AudioLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes in-memory audio bytes into per-channel PCM planes.
pub fn decode_bytes(bytes: Vec<u8>) -> Result<PcmBuffer, AudioError> {
    let decoder = Decoder::new(Cursor::new(bytes))?;
    let sample_rate = decoder.sample_rate();
    let channel_count = decoder.channels() as usize;
    let interleaved: Vec<f32> = decoder.convert_samples().collect();
    let buffer = PcmBuffer::from_interleaved(&interleaved, channel_count, sample_rate);
    info!(
        "decoded audio: {} Hz, {} channel(s), {:.2}s",
        buffer.sample_rate(),
        buffer.channel_count(),
        buffer.duration_seconds()
    );
    Ok(buffer)
}
