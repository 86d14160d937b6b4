// Media ingestion: container probing, metadata extraction and audio
// extraction via FFmpeg subprocesses.

pub mod extract;
pub mod ffmpeg;
pub mod probe;

pub use extract::{decode_audio_samples, extract_audio, TempAudio};
pub use ffmpeg::{find_ffmpeg_path, find_ffprobe_path};
pub use probe::{extract_metadata, validate, MediaMetadata};

use std::fmt;
use std::path::PathBuf;

/// Errors from the media ingestion stage. Non-retryable; no partial metadata
/// is returned alongside one of these.
#[derive(Debug)]
pub enum IngestionError {
    /// Input file does not exist or is not a regular file
    FileNotFound(PathBuf),
    /// Input file exceeds the configured maximum size
    FileTooLarge { path: PathBuf, size: u64, max: u64 },
    /// ffprobe/ffmpeg binary could not be located
    ToolMissing(String),
    /// Container could not be demuxed or probed
    ProbeFailed(String),
    /// Container holds no decodable audio or video stream
    NoDecodableStream(PathBuf),
    /// Audio decode/extraction failed
    DecodeFailed(String),
}

impl fmt::Display for IngestionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestionError::FileNotFound(path) => {
                write!(f, "Media file not found: {}", path.display())
            }
            IngestionError::FileTooLarge { path, size, max } => write!(
                f,
                "Media file too large: {} ({} bytes, max {})",
                path.display(),
                size,
                max
            ),
            IngestionError::ToolMissing(tool) => {
                write!(f, "{} not found. Please install FFmpeg.", tool)
            }
            IngestionError::ProbeFailed(msg) => write!(f, "Failed to probe media: {}", msg),
            IngestionError::NoDecodableStream(path) => {
                write!(f, "No decodable stream found in {}", path.display())
            }
            IngestionError::DecodeFailed(msg) => write!(f, "Failed to decode audio: {}", msg),
        }
    }
}

impl std::error::Error for IngestionError {}

/// Configuration for media ingestion
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Directory extracted audio files are written to
    pub work_dir: PathBuf,
    /// Maximum accepted media file size in bytes
    pub max_media_bytes: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let work_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("rapport")
            .join("audio");
        Self {
            work_dir,
            // 500MB, matching the historical upload ceiling
            max_media_bytes: 500_000_000,
        }
    }
}
