// Diarization engine using pyannote-rs
// Segmentation plus speaker-embedding clustering with per-call labels.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::{debug, info, warn};
use pyannote_rs::{get_segments, EmbeddingExtractor, EmbeddingManager};

use super::{DiarizationError, SpeakerDiarizer};
use crate::media::decode_audio_samples;
use crate::transcript::SpeakerTurn;

/// Configuration for diarization
#[derive(Debug, Clone)]
pub struct DiarizationConfig {
    /// Path to segmentation model (segmentation-3.0.onnx)
    pub segmentation_model_path: PathBuf,
    /// Path to speaker embedding model (wespeaker_en_voxceleb_CAM++.onnx)
    pub embedding_model_path: PathBuf,
    /// Maximum number of speakers to track per file
    pub max_speakers: usize,
    /// Similarity threshold for clustering embeddings (0.0 to 1.0)
    pub similarity_threshold: f32,
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            segmentation_model_path: PathBuf::new(),
            embedding_model_path: PathBuf::new(),
            max_speakers: 10,
            similarity_threshold: 0.5,
        }
    }
}

/// Diarizer backed by pyannote-rs segmentation and speaker embeddings.
///
/// Every call clusters embeddings from scratch, so labels (`speaker_0`,
/// `speaker_1`, ...) are tagged in first-seen order within one file and carry
/// no meaning across calls.
pub struct PyannoteDiarizer {
    config: DiarizationConfig,
    embedding_extractor: Arc<Mutex<EmbeddingExtractor>>,
}

impl PyannoteDiarizer {
    /// Create a new diarizer, loading the embedding model eagerly.
    pub fn new(config: DiarizationConfig) -> Result<Self, DiarizationError> {
        info!("Initializing pyannote diarizer");
        debug!("Segmentation model: {:?}", config.segmentation_model_path);
        debug!("Embedding model: {:?}", config.embedding_model_path);

        if !config.segmentation_model_path.exists() {
            return Err(DiarizationError::ModelLoadFailed(format!(
                "segmentation model not found: {}",
                config.segmentation_model_path.display()
            )));
        }
        if !config.embedding_model_path.exists() {
            return Err(DiarizationError::ModelLoadFailed(format!(
                "embedding model not found: {}",
                config.embedding_model_path.display()
            )));
        }

        // pyannote-rs reports errors through eyre, convert at the boundary
        let embedding_extractor = EmbeddingExtractor::new(&config.embedding_model_path)
            .map_err(|e| DiarizationError::ModelLoadFailed(e.to_string()))?;

        Ok(Self {
            config,
            embedding_extractor: Arc::new(Mutex::new(embedding_extractor)),
        })
    }
}

#[async_trait]
impl SpeakerDiarizer for PyannoteDiarizer {
    async fn diarize(&self, audio_path: &Path) -> Result<Vec<SpeakerTurn>, DiarizationError> {
        let (samples, sample_rate) = decode_audio_samples(audio_path)
            .map_err(|e| DiarizationError::AudioDecodeFailed(e.to_string()))?;

        let extractor = self.embedding_extractor.clone();
        let segmentation_model = self.config.segmentation_model_path.clone();
        let max_speakers = self.config.max_speakers;
        let threshold = self.config.similarity_threshold;

        let turns = tokio::task::spawn_blocking(move || {
            diarize_samples(
                &samples,
                sample_rate,
                &segmentation_model,
                &extractor,
                max_speakers,
                threshold,
            )
        })
        .await
        .map_err(|e| DiarizationError::EngineFailed(format!("diarization task failed: {}", e)))??;

        info!(
            "Diarization produced {} turns from {}",
            turns.len(),
            audio_path.display()
        );
        Ok(turns)
    }
}

fn diarize_samples(
    samples: &[f32],
    sample_rate: u32,
    segmentation_model: &Path,
    extractor: &Mutex<EmbeddingExtractor>,
    max_speakers: usize,
    threshold: f32,
) -> Result<Vec<SpeakerTurn>, DiarizationError> {
    // pyannote-rs consumes i16 samples
    let samples_i16: Vec<i16> = samples
        .iter()
        .map(|&s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16)
        .collect();

    let segments_iter = get_segments(&samples_i16, sample_rate, segmentation_model)
        .map_err(|e| DiarizationError::EngineFailed(format!("segmentation failed: {}", e)))?;

    // Fresh clustering state per call keeps labels opaque per-run
    let mut embedding_manager = EmbeddingManager::new(max_speakers);
    let mut extractor = extractor
        .lock()
        .map_err(|e| DiarizationError::EngineFailed(format!("embedding extractor poisoned: {}", e)))?;

    let mut turns = Vec::new();
    for segment_result in segments_iter {
        let segment = match segment_result {
            Ok(seg) => seg,
            Err(e) => {
                warn!("Failed to process diarization segment: {}", e);
                continue;
            }
        };

        let embedding: Vec<f32> = match extractor.compute(&segment.samples) {
            Ok(iter) => iter.collect(),
            Err(e) => {
                warn!("Failed to compute embedding for segment: {}", e);
                continue;
            }
        };

        let label = match embedding_manager.search_speaker(embedding, threshold) {
            Some(speaker_idx) => format!("speaker_{}", speaker_idx),
            None => {
                // Clustering capacity exhausted
                warn!(
                    "Max speakers ({}) reached, segment assigned to overflow label",
                    max_speakers
                );
                format!("speaker_{}", max_speakers)
            }
        };

        turns.push(SpeakerTurn::new(segment.start, segment.end, label));
    }

    Ok(turns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DiarizationConfig::default();
        assert_eq!(config.max_speakers, 10);
        assert_eq!(config.similarity_threshold, 0.5);
    }

    #[test]
    fn test_missing_models_rejected() {
        let config = DiarizationConfig {
            segmentation_model_path: PathBuf::from("/nonexistent/segmentation.onnx"),
            embedding_model_path: PathBuf::from("/nonexistent/embedding.onnx"),
            ..DiarizationConfig::default()
        };
        let err = PyannoteDiarizer::new(config).unwrap_err();
        assert!(matches!(err, DiarizationError::ModelLoadFailed(_)));
    }
}
