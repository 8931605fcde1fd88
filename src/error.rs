use std::path::PathBuf;
use thiserror::Error;

/// Failures from loading, decoding, and playing audio.
///
/// Each variant is a distinct, reportable kind; none of them is retried
/// internally. A live-data read with no analysis tap is not an error at
/// all — those calls return `None` instead.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The platform audio output could not be opened.
    #[error("audio output unavailable: {0}")]
    Init(#[from] rodio::StreamError),

    /// The source string was neither a usable URL nor a file path.
    #[error("invalid audio source: {0}")]
    Source(String),

    /// Fetching bytes over the network failed.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Reading bytes from a local file failed.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The retrieved bytes were not decodable as audio.
    #[error("could not decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),

    /// Playback could not be started on the output device.
    #[error("playback failed: {0}")]
    Playback(#[from] rodio::PlayError),

    /// An operation that needs a decoded buffer ran before one was loaded.
    #[error("no audio buffer loaded")]
    NoBuffer,
}
