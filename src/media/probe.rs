// Container probing via ffprobe.
//
// Metadata-only inspection: `-show_format -show_streams` never decodes the
// payload, so probing stays fast even for large recordings.

use std::path::Path;
use std::process::Command;

use log::{debug, warn};
use serde::Deserialize;

use super::ffmpeg::find_ffprobe_path;
use super::{IngestConfig, IngestionError};

/// Container metadata reported by ffprobe
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMetadata {
    /// Container duration in seconds
    pub duration: f64,
    /// Frame width, if a video stream exists
    pub width: Option<u32>,
    /// Frame height, if a video stream exists
    pub height: Option<u32>,
    /// Codec name of the video stream, or of the first audio stream for
    /// audio-only containers
    pub codec: String,
    /// Container bitrate in bits per second
    pub bitrate: u64,
    /// Container format name (e.g. "mov,mp4,m4a,3gp,3g2,mj2")
    pub container: String,
}

// ffprobe emits numeric format fields as JSON strings
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    format_name: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

/// Validate a media file for processing. Fails closed: any missing file,
/// oversized file, unprobeable container or stream-less container yields
/// `false`, never an error.
pub fn validate(path: &Path, config: &IngestConfig) -> bool {
    let size = match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => return false,
    };

    if size > config.max_media_bytes {
        warn!(
            "Rejecting {}: {} bytes exceeds limit of {}",
            path.display(),
            size,
            config.max_media_bytes
        );
        return false;
    }

    let probe = match run_ffprobe(path) {
        Ok(probe) => probe,
        Err(e) => {
            debug!("Probe failed for {}: {}", path.display(), e);
            return false;
        }
    };

    probe.streams.iter().any(|s| {
        matches!(
            s.codec_type.as_deref(),
            Some("video") | Some("audio")
        )
    })
}

/// Extract container metadata without decoding the file.
pub fn extract_metadata(path: &Path) -> Result<MediaMetadata, IngestionError> {
    if !path.is_file() {
        return Err(IngestionError::FileNotFound(path.to_path_buf()));
    }

    let probe = run_ffprobe(path)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let audio_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    let codec_stream = video_stream
        .or(audio_stream)
        .ok_or_else(|| IngestionError::NoDecodableStream(path.to_path_buf()))?;

    let format = probe
        .format
        .ok_or_else(|| IngestionError::ProbeFailed("missing format section".to_string()))?;

    Ok(MediaMetadata {
        duration: format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0),
        width: video_stream.and_then(|s| s.width),
        height: video_stream.and_then(|s| s.height),
        codec: codec_stream.codec_name.clone().unwrap_or_default(),
        bitrate: format
            .bit_rate
            .as_deref()
            .and_then(|b| b.parse::<u64>().ok())
            .unwrap_or(0),
        container: format.format_name.unwrap_or_default(),
    })
}

fn run_ffprobe(path: &Path) -> Result<ProbeOutput, IngestionError> {
    let ffprobe_path = find_ffprobe_path()
        .ok_or_else(|| IngestionError::ToolMissing("ffprobe".to_string()))?;

    let output = Command::new(&ffprobe_path)
        .arg("-v")
        .arg("error")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(path)
        .output()
        .map_err(|e| IngestionError::ProbeFailed(format!("failed to spawn ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IngestionError::ProbeFailed(stderr.trim().to_string()));
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|e| IngestionError::ProbeFailed(format!("unparseable ffprobe output: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_missing_file_is_false() {
        let config = IngestConfig::default();
        assert!(!validate(Path::new("/nonexistent/meeting.mp4"), &config));
    }

    #[test]
    fn test_validate_oversized_file_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.mp4");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 1024]).unwrap();

        let config = IngestConfig {
            max_media_bytes: 16,
            ..IngestConfig::default()
        };
        assert!(!validate(&path, &config));
    }

    #[test]
    fn test_extract_metadata_missing_file() {
        let err = extract_metadata(Path::new("/nonexistent/meeting.mp4")).unwrap_err();
        assert!(matches!(err, IngestionError::FileNotFound(_)));
    }

    #[test]
    fn test_probe_output_parsing() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "codec_name": "h264", "width": 1280, "height": 720},
                {"codec_type": "audio", "codec_name": "aac"}
            ],
            "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "62.5", "bit_rate": "128000"}
        }"#;
        let probe: ProbeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(probe.streams.len(), 2);
        assert_eq!(probe.streams[0].width, Some(1280));
        assert_eq!(probe.format.unwrap().duration.as_deref(), Some("62.5"));
    }
}
