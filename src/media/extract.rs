// Audio extraction and decoding via FFmpeg subprocesses.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info, warn};

use super::ffmpeg::find_ffmpeg_path;
use super::{IngestConfig, IngestionError};

/// Handle to an extracted audio file. Removes the file when dropped so
/// temporary audio never outlives the meeting that produced it, on success
/// and failure paths alike.
#[derive(Debug)]
pub struct TempAudio {
    path: PathBuf,
    keep: bool,
}

impl TempAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm cleanup and hand ownership of the file to the caller.
    pub fn into_path(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for TempAudio {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(
                    "Failed to remove temporary audio {}: {}",
                    self.path.display(),
                    e
                );
            } else {
                debug!("Removed temporary audio {}", self.path.display());
            }
        }
    }
}

/// Extract a mono 16kHz 16-bit PCM WAV from a media file.
///
/// The output lands at a deterministic location under the configured work
/// directory, derived from the input file stem; a pre-existing file at that
/// path is overwritten.
pub fn extract_audio(path: &Path, config: &IngestConfig) -> Result<TempAudio, IngestionError> {
    if !path.is_file() {
        return Err(IngestionError::FileNotFound(path.to_path_buf()));
    }

    let ffmpeg_path = find_ffmpeg_path()
        .ok_or_else(|| IngestionError::ToolMissing("ffmpeg".to_string()))?;

    std::fs::create_dir_all(&config.work_dir)
        .map_err(|e| IngestionError::DecodeFailed(format!("cannot create work dir: {}", e)))?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string());
    let audio_path = config.work_dir.join(format!("{}_audio.wav", stem));

    info!(
        "Extracting audio from {} to {}",
        path.display(),
        audio_path.display()
    );

    let output = Command::new(&ffmpeg_path)
        .arg("-y")
        .arg("-i")
        .arg(path)
        .arg("-vn")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ac")
        .arg("1")
        .arg("-ar")
        .arg("16000")
        .arg(&audio_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| IngestionError::DecodeFailed(format!("failed to spawn ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IngestionError::DecodeFailed(stderr.trim().to_string()));
    }

    Ok(TempAudio {
        path: audio_path,
        keep: false,
    })
}

/// Decode an audio file to raw f32 samples at 16kHz mono, the format the
/// speech and diarization engines expect.
pub fn decode_audio_samples(audio_path: &Path) -> Result<(Vec<f32>, u32), IngestionError> {
    if !audio_path.is_file() {
        return Err(IngestionError::FileNotFound(audio_path.to_path_buf()));
    }

    let ffmpeg_path = find_ffmpeg_path()
        .ok_or_else(|| IngestionError::ToolMissing("ffmpeg".to_string()))?;

    debug!("Decoding audio file: {}", audio_path.display());

    let mut child = Command::new(&ffmpeg_path)
        .arg("-i")
        .arg(audio_path)
        .arg("-f")
        .arg("f32le")
        .arg("-acodec")
        .arg("pcm_f32le")
        .arg("-ar")
        .arg("16000")
        .arg("-ac")
        .arg("1")
        .arg("-")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| IngestionError::DecodeFailed(format!("failed to spawn ffmpeg: {}", e)))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| IngestionError::DecodeFailed("failed to capture ffmpeg stdout".to_string()))?;

    let mut raw_bytes = Vec::new();
    stdout
        .read_to_end(&mut raw_bytes)
        .map_err(|e| IngestionError::DecodeFailed(e.to_string()))?;

    let output = child
        .wait_with_output()
        .map_err(|e| IngestionError::DecodeFailed(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IngestionError::DecodeFailed(stderr.trim().to_string()));
    }

    if raw_bytes.len() % 4 != 0 {
        return Err(IngestionError::DecodeFailed(format!(
            "invalid audio data length: {} bytes (not divisible by 4)",
            raw_bytes.len()
        )));
    }

    let samples: Vec<f32> = raw_bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    let duration_seconds = samples.len() as f32 / 16000.0;
    info!(
        "Decoded {} samples ({:.2} seconds) from {}",
        samples.len(),
        duration_seconds,
        audio_path.display()
    );

    Ok((samples, 16000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_audio_missing_input() {
        let config = IngestConfig::default();
        let err = extract_audio(Path::new("/nonexistent/meeting.mp4"), &config).unwrap_err();
        assert!(matches!(err, IngestionError::FileNotFound(_)));
    }

    #[test]
    fn test_temp_audio_removes_file_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch_audio.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        {
            let _audio = TempAudio {
                path: path.clone(),
                keep: false,
            };
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_into_path_disarms_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kept_audio.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let audio = TempAudio {
            path: path.clone(),
            keep: false,
        };
        let out = audio.into_path();
        assert_eq!(out, path);
        assert!(path.exists());
    }
}
