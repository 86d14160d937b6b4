// Align speaker turns with transcript segments by time overlap.
// For each transcript segment, find the speaker with the most accumulated
// overlap across all of that speaker's turns.

use std::fmt;

use log::debug;

use crate::transcript::{SpeakerTurn, TranscriptSegment, UNKNOWN_SPEAKER};

/// Errors from alignment. Only structurally invalid input fails; a segment
/// with no overlapping turn degrades to `UNKNOWN` instead.
#[derive(Debug)]
pub enum AlignmentError {
    /// A segment or turn with negative duration (end before start)
    InvalidInterval {
        kind: &'static str,
        start: f64,
        end: f64,
    },
    /// Transcript segments were not in non-decreasing start order
    UnorderedTranscript { index: usize },
}

impl fmt::Display for AlignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentError::InvalidInterval { kind, start, end } => write!(
                f,
                "Invalid {} interval: start {:.3}s is after end {:.3}s",
                kind, start, end
            ),
            AlignmentError::UnorderedTranscript { index } => write!(
                f,
                "Transcript segments out of order at index {}",
                index
            ),
        }
    }
}

impl std::error::Error for AlignmentError {}

/// Strict interval intersection: touching endpoints do not count as overlap.
pub fn segments_overlap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
    !(a_end <= b_start || b_end <= a_start)
}

/// Duration of the overlap between two intervals, clamped at zero.
pub fn overlap_duration(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    (a_end.min(b_end) - a_start.max(b_start)).max(0.0)
}

/// Assign a speaker to every transcript segment from diarized turns.
///
/// For each segment, overlap durations are accumulated per speaker label
/// across all overlapping turns and the label with the largest total wins.
/// Ties go to the first-encountered label, stable by turn iteration order —
/// inherited behavior, kept deliberately. Segments no turn overlaps get
/// `UNKNOWN`. Re-running with the same turns overwrites assignments rather
/// than accumulating, so alignment is idempotent.
///
/// O(segments x turns); fine at meeting scale. Interval-index the turns
/// before calling this if you are processing much larger inputs.
pub fn align(
    mut transcript: Vec<TranscriptSegment>,
    turns: &[SpeakerTurn],
) -> Result<Vec<TranscriptSegment>, AlignmentError> {
    for (i, segment) in transcript.iter().enumerate() {
        if segment.end < segment.start {
            return Err(AlignmentError::InvalidInterval {
                kind: "segment",
                start: segment.start,
                end: segment.end,
            });
        }
        if i > 0 && segment.start < transcript[i - 1].start {
            return Err(AlignmentError::UnorderedTranscript { index: i });
        }
    }
    for turn in turns {
        if turn.end < turn.start {
            return Err(AlignmentError::InvalidInterval {
                kind: "turn",
                start: turn.start,
                end: turn.end,
            });
        }
    }

    for segment in &mut transcript {
        // First-seen order is the tie-break, so accumulate into a Vec rather
        // than a map
        let mut durations: Vec<(&str, f64)> = Vec::new();

        for turn in turns {
            if !segments_overlap(segment.start, segment.end, turn.start, turn.end) {
                continue;
            }
            let overlap = overlap_duration(segment.start, segment.end, turn.start, turn.end);
            match durations.iter_mut().find(|(label, _)| *label == turn.speaker) {
                Some((_, total)) => *total += overlap,
                None => durations.push((&turn.speaker, overlap)),
            }
        }

        let dominant = durations
            .iter()
            .fold(None::<(&str, f64)>, |best, &(label, total)| match best {
                Some((_, best_total)) if total <= best_total => best,
                _ => Some((label, total)),
            });

        match dominant {
            Some((label, total)) => {
                debug!(
                    "Segment [{:.1}s-{:.1}s] assigned to {} ({:.2}s overlap)",
                    segment.start, segment.end, label, total
                );
                segment.speaker = Some(label.to_string());
            }
            None => {
                debug!(
                    "Segment [{:.1}s-{:.1}s] had no overlapping turns",
                    segment.start, segment.end
                );
                segment.speaker = Some(UNKNOWN_SPEAKER.to_string());
            }
        }
    }

    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    #[test]
    fn test_dominant_speaker_wins() {
        let transcript = vec![seg(0.0, 2.0, "hi"), seg(1.5, 3.0, "there")];
        let turns = vec![
            SpeakerTurn::new(0.0, 2.2, "A"),
            SpeakerTurn::new(1.0, 3.0, "B"),
        ];

        let aligned = align(transcript, &turns).unwrap();
        // Segment 1 overlaps A for 2.0s and B for 1.0s
        assert_eq!(aligned[0].speaker.as_deref(), Some("A"));
        // Segment 2 overlaps A for 0.7s and B for 1.5s
        assert_eq!(aligned[1].speaker.as_deref(), Some("B"));
    }

    #[test]
    fn test_no_overlap_gets_unknown() {
        let transcript = vec![seg(0.0, 1.0, "hello"), seg(5.0, 6.0, "anyone")];
        let turns = vec![SpeakerTurn::new(0.0, 1.0, "A")];

        let aligned = align(transcript, &turns).unwrap();
        assert_eq!(aligned[0].speaker.as_deref(), Some("A"));
        assert_eq!(aligned[1].speaker.as_deref(), Some(UNKNOWN_SPEAKER));
    }

    #[test]
    fn test_every_segment_gets_a_speaker() {
        let transcript = vec![seg(0.0, 1.0, "a"), seg(1.0, 2.0, "b"), seg(2.0, 3.0, "c")];
        let aligned = align(transcript, &[]).unwrap();
        assert!(aligned.iter().all(|s| s.speaker.is_some()));
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        // Turn ends exactly where the segment starts
        let transcript = vec![seg(1.0, 2.0, "hi")];
        let turns = vec![SpeakerTurn::new(0.0, 1.0, "A")];

        let aligned = align(transcript, &turns).unwrap();
        assert_eq!(aligned[0].speaker.as_deref(), Some(UNKNOWN_SPEAKER));
    }

    #[test]
    fn test_tie_break_first_encountered_label() {
        // Both speakers overlap the segment for exactly 1.0s; A appears first
        // in turn order and must win
        let transcript = vec![seg(0.0, 2.0, "tied")];
        let turns = vec![
            SpeakerTurn::new(0.0, 1.0, "A"),
            SpeakerTurn::new(1.0, 2.0, "B"),
        ];

        let aligned = align(transcript, &turns).unwrap();
        assert_eq!(aligned[0].speaker.as_deref(), Some("A"));
    }

    #[test]
    fn test_overlap_accumulates_across_turns() {
        // B has a single 1.2s turn; A has two 0.7s turns that together beat it
        let transcript = vec![seg(0.0, 3.0, "long one")];
        let turns = vec![
            SpeakerTurn::new(0.0, 0.7, "A"),
            SpeakerTurn::new(0.8, 2.0, "B"),
            SpeakerTurn::new(2.1, 2.8, "A"),
        ];

        let aligned = align(transcript, &turns).unwrap();
        assert_eq!(aligned[0].speaker.as_deref(), Some("A"));
    }

    #[test]
    fn test_alignment_is_deterministic() {
        let transcript = vec![seg(0.0, 2.0, "hi"), seg(1.5, 3.0, "there")];
        let turns = vec![
            SpeakerTurn::new(0.0, 2.2, "A"),
            SpeakerTurn::new(1.0, 3.0, "B"),
        ];

        let first = align(transcript.clone(), &turns).unwrap();
        let second = align(transcript, &turns).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_alignment_is_idempotent() {
        let transcript = vec![seg(0.0, 2.0, "hi"), seg(1.5, 3.0, "there")];
        let turns = vec![
            SpeakerTurn::new(0.0, 2.2, "A"),
            SpeakerTurn::new(1.0, 3.0, "B"),
        ];

        let once = align(transcript, &turns).unwrap();
        let twice = align(once.clone(), &turns).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_negative_duration_segment_rejected() {
        let transcript = vec![seg(2.0, 1.0, "backwards")];
        let err = align(transcript, &[]).unwrap_err();
        assert!(matches!(err, AlignmentError::InvalidInterval { kind: "segment", .. }));
    }

    #[test]
    fn test_negative_duration_turn_rejected() {
        let transcript = vec![seg(0.0, 1.0, "ok")];
        let turns = vec![SpeakerTurn::new(3.0, 2.0, "A")];
        let err = align(transcript, &turns).unwrap_err();
        assert!(matches!(err, AlignmentError::InvalidInterval { kind: "turn", .. }));
    }

    #[test]
    fn test_unordered_transcript_rejected() {
        let transcript = vec![seg(2.0, 3.0, "b"), seg(0.0, 1.0, "a")];
        let err = align(transcript, &[]).unwrap_err();
        assert!(matches!(err, AlignmentError::UnorderedTranscript { index: 1 }));
    }
}
