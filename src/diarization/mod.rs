// Speaker diarization: the diarizer port and the pyannote-rs adapter.

pub mod pyannote;

pub use pyannote::{DiarizationConfig, PyannoteDiarizer};

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::transcript::SpeakerTurn;

/// Errors from the diarization stage. Non-retryable by the core; often
/// transient resource exhaustion a caller may retry with backoff.
#[derive(Debug)]
pub enum DiarizationError {
    /// Segmentation or embedding model could not be loaded
    ModelLoadFailed(String),
    /// Input audio could not be decoded
    AudioDecodeFailed(String),
    /// The engine itself failed
    EngineFailed(String),
}

impl fmt::Display for DiarizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiarizationError::ModelLoadFailed(msg) => {
                write!(f, "Failed to load diarization model: {}", msg)
            }
            DiarizationError::AudioDecodeFailed(msg) => {
                write!(f, "Failed to decode audio for diarization: {}", msg)
            }
            DiarizationError::EngineFailed(msg) => write!(f, "Diarization failed: {}", msg),
        }
    }
}

impl std::error::Error for DiarizationError {}

/// Port for speaker diarization engines.
///
/// Turns are non-overlapping per speaker but may overlap across speakers
/// (simultaneous speech is representable). Labels are opaque per-call tokens:
/// the same voice gets no guaranteed label across files or re-runs.
#[async_trait]
pub trait SpeakerDiarizer: Send + Sync {
    /// Compute speaker-turn intervals for the audio file at `audio_path`,
    /// ordered by start time.
    async fn diarize(&self, audio_path: &Path) -> Result<Vec<SpeakerTurn>, DiarizationError>;
}
