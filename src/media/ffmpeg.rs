// FFmpeg binary discovery.
//
// Prefers a system install on PATH, then falls back to the ffmpeg-sidecar
// managed binaries next to the executable.

use std::path::PathBuf;

use anyhow::Result;
use log::info;

/// Locate the ffmpeg binary, checking PATH first and then the sidecar
/// directory.
pub fn find_ffmpeg_path() -> Option<PathBuf> {
    if let Ok(path) = which::which("ffmpeg") {
        return Some(path);
    }

    let sidecar = ffmpeg_sidecar::paths::ffmpeg_path();
    if sidecar.exists() {
        return Some(sidecar);
    }

    None
}

/// Locate the ffprobe binary, checking PATH first and then the sidecar
/// directory.
pub fn find_ffprobe_path() -> Option<PathBuf> {
    if let Ok(path) = which::which("ffprobe") {
        return Some(path);
    }

    let sidecar = ffmpeg_sidecar::ffprobe::ffprobe_path();
    if sidecar.exists() {
        return Some(sidecar);
    }

    None
}

/// Ensure an ffmpeg binary is available, downloading the sidecar build when
/// nothing is installed on the system.
pub fn ensure_ffmpeg() -> Result<PathBuf> {
    if let Some(path) = find_ffmpeg_path() {
        return Ok(path);
    }

    info!("FFmpeg not found on PATH, downloading sidecar build");
    ffmpeg_sidecar::download::auto_download()
        .map_err(|e| anyhow::anyhow!("Failed to download FFmpeg: {}", e))?;

    Ok(ffmpeg_sidecar::paths::ffmpeg_path())
}
