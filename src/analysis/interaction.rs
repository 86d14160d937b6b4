// Per-speaker discourse patterns: key contributions, response adjacency and
// interruption relationships derived from segment overlap geometry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::alignment::overlap_duration;
use super::participation::ParticipationSummary;
use crate::transcript::TranscriptSegment;

/// Overlap beyond this many seconds classifies simultaneous speech as an
/// interruption. The comparison is strictly greater-than: an overlap of
/// exactly 0.5s does not count.
pub const INTERRUPTION_OVERLAP_SECS: f64 = 0.5;

/// Interaction patterns for one speaker. Derived, read-only after
/// construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InteractionProfile {
    /// Number of segments attributed to this speaker
    pub total_contributions: usize,
    /// Mean words per segment
    pub average_segment_length: f64,
    /// Share of meeting time, copied from the participation stats
    pub participation_percentage: f64,
    /// The 3 longest segments by word count, descending (ties keep original
    /// order); fewer if the speaker has fewer segments
    pub key_contributions: Vec<String>,
    /// Counts of this speaker following another speaker, keyed by the other
    /// speaker's label. Adjacency is measured within this speaker's own
    /// segment list, not the globally time-ordered transcript.
    pub responds_to: HashMap<String, u32>,
    /// Counts of other speakers starting before and overlapping into this
    /// speaker's segments
    pub interrupted_by: HashMap<String, u32>,
    /// Counts of this speaker overlapping into other speakers' segments
    pub interrupts: HashMap<String, u32>,
}

/// Build an interaction profile for every speaker in the participation
/// summary.
///
/// Interruption detection is a full cross-product per speaker, O(segments^2);
/// acceptable at meeting scale. Bucket segments by time window first when
/// processing very long transcripts.
pub fn analyze_interactions(
    transcript: &[TranscriptSegment],
    summary: &ParticipationSummary,
) -> HashMap<String, InteractionProfile> {
    let mut profiles = HashMap::new();

    for (speaker, stats) in &summary.speakers {
        let speaker_segments: Vec<&TranscriptSegment> = transcript
            .iter()
            .filter(|s| s.speaker_or_unknown() == speaker)
            .collect();

        let average_segment_length = if speaker_segments.is_empty() {
            0.0
        } else {
            stats.total_words as f64 / speaker_segments.len() as f64
        };

        let mut profile = InteractionProfile {
            total_contributions: speaker_segments.len(),
            average_segment_length,
            participation_percentage: stats.percentage,
            key_contributions: extract_key_contributions(&speaker_segments),
            ..InteractionProfile::default()
        };

        record_responses(&speaker_segments, &mut profile);
        record_interruptions(&speaker_segments, transcript, &mut profile);

        profiles.insert(speaker.clone(), profile);
    }

    profiles
}

/// The 3 longest segments by word count. A stable sort keeps original order
/// among equal-length segments.
fn extract_key_contributions(speaker_segments: &[&TranscriptSegment]) -> Vec<String> {
    let mut sorted = speaker_segments.to_vec();
    sorted.sort_by_key(|s| std::cmp::Reverse(s.word_count()));
    sorted.iter().take(3).map(|s| s.text.clone()).collect()
}

fn record_responses(speaker_segments: &[&TranscriptSegment], profile: &mut InteractionProfile) {
    for pair in speaker_segments.windows(2) {
        let (prev, current) = (pair[0], pair[1]);
        if prev.speaker_or_unknown() != current.speaker_or_unknown() {
            *profile
                .responds_to
                .entry(prev.speaker_or_unknown().to_string())
                .or_insert(0) += 1;
        }
    }
}

fn record_interruptions(
    speaker_segments: &[&TranscriptSegment],
    transcript: &[TranscriptSegment],
    profile: &mut InteractionProfile,
) {
    for segment in speaker_segments {
        for other in transcript {
            if other.speaker_or_unknown() == segment.speaker_or_unknown() {
                continue;
            }
            let overlap = overlap_duration(segment.start, segment.end, other.start, other.end);
            if overlap > INTERRUPTION_OVERLAP_SECS {
                let other_speaker = other.speaker_or_unknown().to_string();
                if other.start < segment.start {
                    *profile.interrupted_by.entry(other_speaker).or_insert(0) += 1;
                } else {
                    *profile.interrupts.entry(other_speaker).or_insert(0) += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::participation::aggregate;

    fn seg(start: f64, end: f64, text: &str, speaker: &str) -> TranscriptSegment {
        TranscriptSegment {
            start,
            end,
            text: text.to_string(),
            speaker: Some(speaker.to_string()),
        }
    }

    fn profiles_for(transcript: &[TranscriptSegment]) -> HashMap<String, InteractionProfile> {
        let summary = aggregate(transcript);
        analyze_interactions(transcript, &summary)
    }

    #[test]
    fn test_key_contributions_longest_three() {
        let transcript = vec![
            seg(0.0, 1.0, "one", "A"),
            seg(1.0, 2.0, "two words here now ok", "A"),
            seg(2.0, 3.0, "three words here", "A"),
            seg(3.0, 4.0, "four words here now", "A"),
            seg(4.0, 5.0, "tiny", "A"),
        ];

        let profiles = profiles_for(&transcript);
        let a = &profiles["A"];
        assert_eq!(
            a.key_contributions,
            vec![
                "two words here now ok".to_string(),
                "four words here now".to_string(),
                "three words here".to_string(),
            ]
        );
    }

    #[test]
    fn test_key_contributions_ties_keep_original_order() {
        let transcript = vec![
            seg(0.0, 1.0, "alpha one", "A"),
            seg(1.0, 2.0, "beta two", "A"),
            seg(2.0, 3.0, "gamma three", "A"),
            seg(3.0, 4.0, "delta four", "A"),
        ];

        let profiles = profiles_for(&transcript);
        // All segments tie at two words; the first three in original order win
        assert_eq!(
            profiles["A"].key_contributions,
            vec![
                "alpha one".to_string(),
                "beta two".to_string(),
                "gamma three".to_string(),
            ]
        );
    }

    #[test]
    fn test_fewer_than_three_contributions() {
        let transcript = vec![seg(0.0, 1.0, "only one", "A")];
        let profiles = profiles_for(&transcript);
        assert_eq!(profiles["A"].key_contributions.len(), 1);
    }

    #[test]
    fn test_responds_to_is_empty_within_own_stream() {
        // Adjacency is measured inside one speaker's own segment list, where
        // every neighbor carries the same label, so the map stays empty even
        // for a perfectly alternating conversation. Inherited measure, kept.
        let transcript = vec![
            seg(0.0, 1.0, "hi", "A"),
            seg(1.0, 2.0, "hello", "B"),
            seg(2.0, 3.0, "how are you", "A"),
            seg(3.0, 4.0, "fine thanks", "B"),
        ];

        let profiles = profiles_for(&transcript);
        assert!(profiles["A"].responds_to.is_empty());
        assert!(profiles["B"].responds_to.is_empty());
    }

    #[test]
    fn test_interruption_symmetry() {
        let transcript = vec![
            seg(0.0, 2.0, "let me finish", "A"),
            seg(1.0, 3.0, "but wait", "B"),
        ];

        let profiles = profiles_for(&transcript);
        // B started while A was speaking with 1.0s overlap
        assert_eq!(profiles["A"].interrupts.get("B"), Some(&1));
        assert_eq!(profiles["B"].interrupted_by.get("A"), Some(&1));
        assert!(profiles["A"].interrupted_by.is_empty());
        assert!(profiles["B"].interrupts.is_empty());
    }

    #[test]
    fn test_exactly_half_second_overlap_is_not_interruption() {
        // Overlap window 1.5-2.0 = exactly 0.5s; strict greater-than means no
        // interruption is recorded
        let transcript = vec![
            seg(0.0, 2.0, "hi", "A"),
            seg(1.5, 3.0, "there", "B"),
        ];

        let profiles = profiles_for(&transcript);
        assert!(profiles["A"].interrupts.is_empty());
        assert!(profiles["A"].interrupted_by.is_empty());
        assert!(profiles["B"].interrupts.is_empty());
        assert!(profiles["B"].interrupted_by.is_empty());
    }

    #[test]
    fn test_just_over_half_second_overlap_counts() {
        let transcript = vec![
            seg(0.0, 2.01, "hi", "A"),
            seg(1.5, 3.0, "there", "B"),
        ];

        let profiles = profiles_for(&transcript);
        assert_eq!(profiles["A"].interrupts.get("B"), Some(&1));
        assert_eq!(profiles["B"].interrupted_by.get("A"), Some(&1));
    }

    #[test]
    fn test_average_segment_length() {
        let transcript = vec![
            seg(0.0, 1.0, "one two three four", "A"),
            seg(1.0, 2.0, "five six", "A"),
        ];

        let profiles = profiles_for(&transcript);
        assert_eq!(profiles["A"].total_contributions, 2);
        assert!((profiles["A"].average_segment_length - 3.0).abs() < 1e-9);
    }
}
