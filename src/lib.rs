// rapport - Speaker-attributed meeting analysis with LLM-generated
// conversation profiles
//
// The pipeline per meeting is linear: media ingestion -> transcription ->
// diarization/alignment -> participation aggregation -> interaction analysis
// -> insight synthesis, feeding per-person profiles a chat agent answers
// questions from. ASR, diarization and the LLM sit behind ports; whisper-rs,
// pyannote-rs and Ollama adapters are bundled.

pub mod analysis;
pub mod chat;
pub mod diarization;
pub mod insight;
pub mod llm;
pub mod media;
pub mod pipeline;
pub mod profile;
pub mod search;
pub mod storage;
pub mod transcript;
pub mod transcription;

pub use analysis::{
    aggregate, align, analyze_interactions, AlignmentError, InteractionProfile,
    ParticipationSummary, SpeakerStats,
};
pub use chat::{ChatAgent, ChatResponse, Confidence, ConversationStore, MemoryConversationStore};
pub use diarization::{DiarizationError, SpeakerDiarizer};
pub use insight::MeetingInsights;
pub use llm::{LlmError, LlmProvider};
pub use media::{IngestConfig, IngestionError, MediaMetadata};
pub use pipeline::{Orchestrator, PipelineConfig, PipelineError, Stage};
pub use profile::{Meeting, PersonaProfile, Profile, ProfileSummary};
pub use search::{PersonSearch, SearchData};
pub use storage::DatabaseManager;
pub use transcript::{SpeakerTurn, TranscriptSegment, UNKNOWN_SPEAKER};
pub use transcription::{SpeechTranscriber, TranscriptionError};
