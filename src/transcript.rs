// Core transcript data types shared by the transcription, diarization and
// analysis stages.

use serde::{Deserialize, Serialize};

/// Speaker value assigned to segments no diarized turn overlaps.
pub const UNKNOWN_SPEAKER: &str = "UNKNOWN";

/// One utterance window produced by the ASR engine.
///
/// `speaker` is `None` until alignment runs; alignment writes it exactly once
/// and the segment is read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Start time in seconds from the beginning of the recording
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Transcribed text, whitespace-trimmed (may be empty for silence)
    pub text: String,
    /// Speaker label, populated by alignment (`UNKNOWN_SPEAKER` when no
    /// diarized turn overlapped the segment)
    #[serde(default)]
    pub speaker: Option<String>,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            speaker: None,
        }
    }

    /// Segment duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Number of whitespace-delimited tokens in the text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Speaker label, falling back to `UNKNOWN_SPEAKER` when alignment has
    /// not run.
    pub fn speaker_or_unknown(&self) -> &str {
        self.speaker.as_deref().unwrap_or(UNKNOWN_SPEAKER)
    }
}

/// One diarization output interval attributed to a single speaker.
///
/// Labels are opaque per-call tokens with no guaranteed stability across runs
/// or files; they are tagged in first-seen order by the diarizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakerTurn {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Diarizer-assigned label (e.g. "speaker_0")
    pub speaker: String,
}

impl SpeakerTurn {
    pub fn new(start: f64, end: f64, speaker: impl Into<String>) -> Self {
        Self {
            start,
            end,
            speaker: speaker.into(),
        }
    }
}
