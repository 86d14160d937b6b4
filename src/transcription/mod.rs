// Speech transcription: the ASR engine port and the bundled whisper-rs
// adapter.

pub mod whisper;

pub use whisper::{WhisperConfig, WhisperTranscriber};

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::transcript::TranscriptSegment;

/// Errors from the speech transcription stage. Non-retryable by the core;
/// callers may retry with backoff since engine failures are often transient
/// resource exhaustion.
#[derive(Debug)]
pub enum TranscriptionError {
    /// ASR model could not be loaded
    ModelLoadFailed(String),
    /// Input audio could not be decoded
    AudioDecodeFailed(String),
    /// The engine itself failed mid-inference
    EngineFailed(String),
}

impl fmt::Display for TranscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptionError::ModelLoadFailed(msg) => {
                write!(f, "Failed to load ASR model: {}", msg)
            }
            TranscriptionError::AudioDecodeFailed(msg) => {
                write!(f, "Failed to decode audio for transcription: {}", msg)
            }
            TranscriptionError::EngineFailed(msg) => write!(f, "Transcription failed: {}", msg),
        }
    }
}

impl std::error::Error for TranscriptionError {}

/// Port for automatic speech recognition engines.
///
/// Implementations return segments in non-decreasing `start` order with
/// whitespace-trimmed text and `speaker` unset; alignment assumes that
/// ordering and re-checks it before running.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    /// Transcribe the audio file at `audio_path`, optionally forcing a
    /// language (None = auto-detect).
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<Vec<TranscriptSegment>, TranscriptionError>;
}
