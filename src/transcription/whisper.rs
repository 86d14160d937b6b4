// Whisper speech recognition adapter built on whisper-rs.
//
// Loads a GGML model once and runs full-file inference; timestamps come back
// in 10ms ticks and are converted to seconds here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::{SpeechTranscriber, TranscriptionError};
use crate::media::decode_audio_samples;
use crate::transcript::TranscriptSegment;

/// Configuration for the whisper transcriber
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the GGML model file (e.g. ggml-base.en.bin)
    pub model_path: PathBuf,
    /// Beam width for beam-search decoding
    pub beam_size: usize,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            beam_size: 5,
            temperature: 0.0,
        }
    }
}

/// ASR engine backed by whisper.cpp via whisper-rs
pub struct WhisperTranscriber {
    config: WhisperConfig,
    context: Arc<WhisperContext>,
}

impl WhisperTranscriber {
    /// Load the model at `config.model_path` and build a transcriber.
    pub fn new(config: WhisperConfig) -> Result<Self, TranscriptionError> {
        if !config.model_path.is_file() {
            return Err(TranscriptionError::ModelLoadFailed(format!(
                "model not found: {}",
                config.model_path.display()
            )));
        }

        info!("Loading whisper model: {}", config.model_path.display());
        let context = WhisperContext::new_with_params(
            &config.model_path.to_string_lossy(),
            WhisperContextParameters::default(),
        )
        .map_err(|e| TranscriptionError::ModelLoadFailed(e.to_string()))?;

        Ok(Self {
            config,
            context: Arc::new(context),
        })
    }
}

#[async_trait]
impl SpeechTranscriber for WhisperTranscriber {
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<Vec<TranscriptSegment>, TranscriptionError> {
        let (samples, sample_rate) = decode_audio_samples(audio_path)
            .map_err(|e| TranscriptionError::AudioDecodeFailed(e.to_string()))?;
        debug!(
            "Transcribing {} samples at {} Hz from {}",
            samples.len(),
            sample_rate,
            audio_path.display()
        );

        let context = self.context.clone();
        let beam_size = self.config.beam_size;
        let temperature = self.config.temperature;
        let language = language.map(|l| l.to_string());

        let segments = tokio::task::spawn_blocking(move || {
            run_inference(&context, &samples, language.as_deref(), beam_size, temperature)
        })
        .await
        .map_err(|e| TranscriptionError::EngineFailed(format!("inference task failed: {}", e)))??;

        info!(
            "Transcription produced {} segments from {}",
            segments.len(),
            audio_path.display()
        );
        Ok(segments)
    }
}

fn run_inference(
    context: &WhisperContext,
    samples: &[f32],
    language: Option<&str>,
    beam_size: usize,
    temperature: f32,
) -> Result<Vec<TranscriptSegment>, TranscriptionError> {
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: beam_size as i32,
        patience: 1.0,
    });
    params.set_language(language);
    params.set_translate(false);
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    params.set_suppress_blank(true);
    params.set_temperature(temperature);
    params.set_no_context(true);

    let mut state = context
        .create_state()
        .map_err(|e| TranscriptionError::EngineFailed(e.to_string()))?;
    state
        .full(params, samples)
        .map_err(|e| TranscriptionError::EngineFailed(e.to_string()))?;

    let num_segments = state
        .full_n_segments()
        .map_err(|e| TranscriptionError::EngineFailed(e.to_string()))?;

    let mut segments = Vec::with_capacity(num_segments as usize);
    for i in 0..num_segments {
        let text = match state.full_get_segment_text_lossy(i) {
            Ok(text) => text,
            Err(_) => continue,
        };

        // Segment timestamps are reported in 10ms ticks
        let start = state.full_get_segment_t0(i).unwrap_or(0) as f64 * 0.01;
        let end = state.full_get_segment_t1(i).unwrap_or(0) as f64 * 0.01;

        segments.push(TranscriptSegment::new(start, end, text.trim()));
    }

    Ok(segments)
}
