// Meeting analysis: diarization-to-transcript alignment, participation
// aggregation and per-speaker interaction patterns.

pub mod alignment;
pub mod interaction;
pub mod participation;

pub use alignment::{align, overlap_duration, segments_overlap, AlignmentError};
pub use interaction::{analyze_interactions, InteractionProfile};
pub use participation::{aggregate, ParticipationSummary, SpeakerStats};
