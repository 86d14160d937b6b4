// Per-speaker participation statistics over an aligned transcript.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::transcript::TranscriptSegment;

/// Talk-time statistics for one speaker.
///
/// `total_duration` sums attributed segment durations without deduplicating
/// against the meeting's true end time, so it can exceed the meeting length
/// when source segments overlap across speakers. `percentage` is computed
/// against the maximum segment end, not the per-speaker sum, so percentages
/// across speakers need not add up to 100. Both are documented behavior, not
/// bugs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpeakerStats {
    /// Sum of segment durations attributed to this speaker, in seconds
    pub total_duration: f64,
    /// Number of attributed segments
    pub segment_count: usize,
    /// Sum of whitespace-delimited token counts
    pub total_words: usize,
    /// total_duration / total_meeting_duration * 100 (0 for an empty meeting)
    pub percentage: f64,
}

/// Aggregated participation for one meeting
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParticipationSummary {
    /// Maximum segment end time across the transcript, in seconds
    pub total_duration: f64,
    /// Per-speaker statistics keyed by speaker label
    pub speakers: HashMap<String, SpeakerStats>,
}

/// Compute per-speaker participation in a single linear pass.
///
/// Accumulation is associative, so the result is identical regardless of
/// segment iteration order. An empty transcript yields a zero duration and
/// an empty speaker map; percentages are 0 rather than dividing by zero.
pub fn aggregate(transcript: &[TranscriptSegment]) -> ParticipationSummary {
    let mut speakers: HashMap<String, SpeakerStats> = HashMap::new();
    let mut total_duration: f64 = 0.0;

    for segment in transcript {
        let stats = speakers
            .entry(segment.speaker_or_unknown().to_string())
            .or_default();
        stats.total_duration += segment.duration();
        stats.segment_count += 1;
        stats.total_words += segment.word_count();

        total_duration = total_duration.max(segment.end);
    }

    if total_duration > 0.0 {
        for stats in speakers.values_mut() {
            stats.percentage = stats.total_duration / total_duration * 100.0;
        }
    }

    ParticipationSummary {
        total_duration,
        speakers,
    }
}
