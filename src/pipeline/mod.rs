// Pipeline orchestration: profile creation, meeting processing and chat
// routing.
//
// Each meeting is a linear batch job: ingestion -> transcription ->
// diarization/alignment -> aggregation -> interaction analysis -> insight
// synthesis. Failures are re-wrapped with the stage they happened in; a
// failed stage aborts the meeting without touching persisted profile data.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio_util::sync::CancellationToken;

use crate::analysis::{aggregate, align, analyze_interactions};
use crate::chat::{ChatAgent, ChatResponse, ConversationStore};
use crate::diarization::SpeakerDiarizer;
use crate::insight;
use crate::llm::LlmProvider;
use crate::media::{extract_audio, extract_metadata, validate, IngestConfig};
use crate::profile::{generate_persona, Meeting, Profile, ProfileSummary};
use crate::search::PersonSearch;
use crate::storage::DatabaseManager;
use crate::transcription::SpeechTranscriber;

/// Pipeline stages, used to tag failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Search,
    Persona,
    Ingestion,
    Transcription,
    Diarization,
    Alignment,
    Aggregation,
    Interaction,
    Synthesis,
    Persistence,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Search => "search",
            Stage::Persona => "persona generation",
            Stage::Ingestion => "ingestion",
            Stage::Transcription => "transcription",
            Stage::Diarization => "diarization",
            Stage::Alignment => "alignment",
            Stage::Aggregation => "aggregation",
            Stage::Interaction => "interaction analysis",
            Stage::Synthesis => "insight synthesis",
            Stage::Persistence => "persistence",
        };
        write!(f, "{}", name)
    }
}

/// Error from the orchestration boundary. Carries the failing stage and the
/// original failure detail.
#[derive(Debug)]
pub enum PipelineError {
    Failed { stage: Stage, source: anyhow::Error },
    TimedOut { stage: Stage, after: Duration },
    Cancelled { stage: Stage },
}

impl PipelineError {
    fn failed(
        stage: Stage,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PipelineError::Failed {
            stage,
            source: anyhow::Error::new(source),
        }
    }

    fn message(stage: Stage, message: impl Into<String>) -> Self {
        PipelineError::Failed {
            stage,
            source: anyhow::anyhow!(message.into()),
        }
    }

    /// The stage this failure happened in.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Failed { stage, .. }
            | PipelineError::TimedOut { stage, .. }
            | PipelineError::Cancelled { stage } => *stage,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Failed { stage, source } => {
                write!(f, "processing failed at {}: {}", stage, source)
            }
            PipelineError::TimedOut { stage, after } => {
                write!(f, "processing timed out at {} after {:?}", stage, after)
            }
            PipelineError::Cancelled { stage } => {
                write!(f, "processing cancelled at {}", stage)
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Failed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub ingest: IngestConfig,
    /// Language hint passed to the ASR engine (None = auto-detect)
    pub language: Option<String>,
    /// Deadline for the ASR engine call
    pub transcription_timeout: Duration,
    /// Deadline for the diarization engine call
    pub diarization_timeout: Duration,
    /// Deadline for each LLM call
    pub llm_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ingest: IngestConfig::default(),
            language: Some("en".to_string()),
            transcription_timeout: Duration::from_secs(600),
            diarization_timeout: Duration::from_secs(600),
            llm_timeout: Duration::from_secs(180),
        }
    }
}

/// Orchestrator wiring the engines, search, storage and chat together.
/// Engines are shared and immutable, so independent meetings can be
/// processed concurrently from the same instance.
pub struct Orchestrator {
    transcriber: Arc<dyn SpeechTranscriber>,
    diarizer: Arc<dyn SpeakerDiarizer>,
    llm: Arc<dyn LlmProvider>,
    search: Arc<dyn PersonSearch>,
    conversations: Arc<dyn ConversationStore>,
    db: Arc<DatabaseManager>,
    config: PipelineConfig,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transcriber: Arc<dyn SpeechTranscriber>,
        diarizer: Arc<dyn SpeakerDiarizer>,
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn PersonSearch>,
        conversations: Arc<dyn ConversationStore>,
        db: Arc<DatabaseManager>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            transcriber,
            diarizer,
            llm,
            search,
            conversations,
            db,
            config,
        }
    }

    /// Create a new profile for a person: search the web, generate a
    /// persona, persist.
    pub async fn create_profile(&self, full_name: &str) -> Result<Profile, PipelineError> {
        info!("Creating profile for '{}'", full_name);

        let search_data = self
            .search
            .search_person(full_name)
            .await
            .map_err(|e| PipelineError::failed(Stage::Search, e))?;

        let cancel = CancellationToken::new();
        let persona = bounded(
            generate_persona(self.llm.as_ref(), &search_data, full_name),
            self.config.llm_timeout,
            &cancel,
            Stage::Persona,
        )
        .await?;

        let profile = Profile::new(full_name, persona);
        self.db
            .save_profile(&profile)
            .map_err(|e| PipelineError::Failed {
                stage: Stage::Persistence,
                source: e,
            })?;

        Ok(profile)
    }

    /// Process a meeting recording and append it to a profile.
    pub async fn process_meeting(
        &self,
        profile_id: &str,
        media_path: &Path,
    ) -> Result<Meeting, PipelineError> {
        self.process_meeting_with_cancel(profile_id, media_path, CancellationToken::new())
            .await
    }

    /// Process a meeting recording with an externally owned cancellation
    /// token covering the engine and LLM calls.
    pub async fn process_meeting_with_cancel(
        &self,
        profile_id: &str,
        media_path: &Path,
        cancel: CancellationToken,
    ) -> Result<Meeting, PipelineError> {
        let profile = self
            .db
            .get_profile(profile_id)
            .map_err(|e| PipelineError::Failed {
                stage: Stage::Persistence,
                source: e,
            })?
            .ok_or_else(|| {
                PipelineError::message(Stage::Persistence, format!("profile not found: {}", profile_id))
            })?;

        info!(
            "Processing meeting {} for profile '{}'",
            media_path.display(),
            profile.full_name
        );

        if !validate(media_path, &self.config.ingest) {
            return Err(PipelineError::message(
                Stage::Ingestion,
                format!("invalid media file: {}", media_path.display()),
            ));
        }

        let metadata = extract_metadata(media_path)
            .map_err(|e| PipelineError::failed(Stage::Ingestion, e))?;
        info!(
            "Media metadata: {:.1}s, codec {}, container {}",
            metadata.duration, metadata.codec, metadata.container
        );

        // Dropped on every exit path below, removing the extracted file
        let audio = extract_audio(media_path, &self.config.ingest)
            .map_err(|e| PipelineError::failed(Stage::Ingestion, e))?;

        let meeting = self
            .run_analysis(media_path, audio.path(), &cancel)
            .await?;

        let mut profile = profile;
        profile.meetings.push(meeting.clone());
        self.db
            .save_profile(&profile)
            .map_err(|e| PipelineError::Failed {
                stage: Stage::Persistence,
                source: e,
            })?;

        Ok(meeting)
    }

    /// Stages 2-6: audio in, finished Meeting out. Persists nothing.
    async fn run_analysis(
        &self,
        media_path: &Path,
        audio_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Meeting, PipelineError> {
        let transcript = bounded(
            self.transcriber
                .transcribe(audio_path, self.config.language.as_deref()),
            self.config.transcription_timeout,
            cancel,
            Stage::Transcription,
        )
        .await?;

        let turns = bounded(
            self.diarizer.diarize(audio_path),
            self.config.diarization_timeout,
            cancel,
            Stage::Diarization,
        )
        .await?;

        let transcript =
            align(transcript, &turns).map_err(|e| PipelineError::failed(Stage::Alignment, e))?;

        let participation = aggregate(&transcript);
        let interactions = analyze_interactions(&transcript, &participation);

        let insights = bounded(
            insight::synthesize(self.llm.as_ref(), &transcript, &participation, interactions),
            self.config.llm_timeout,
            cancel,
            Stage::Synthesis,
        )
        .await?;

        Ok(Meeting::new(
            media_path.to_path_buf(),
            transcript,
            participation,
            insights,
        ))
    }

    /// Answer a chat query about a person, drawing on their persona and the
    /// latest meeting's insights.
    pub async fn chat(
        &self,
        profile_id: &str,
        query: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, PipelineError> {
        let profile = self
            .db
            .get_profile(profile_id)
            .map_err(|e| PipelineError::Failed {
                stage: Stage::Persistence,
                source: e,
            })?
            .ok_or_else(|| {
                PipelineError::message(Stage::Persistence, format!("profile not found: {}", profile_id))
            })?;

        let latest_insights = profile.latest_meeting().map(|m| &m.insights);

        let agent = ChatAgent::new(self.llm.as_ref(), self.conversations.as_ref());
        let cancel = CancellationToken::new();
        bounded(
            agent.process_query(query, Some(&profile.persona), latest_insights, conversation_id),
            self.config.llm_timeout,
            &cancel,
            Stage::Synthesis,
        )
        .await
    }

    /// List stored profile summaries.
    pub fn list_profiles(&self) -> Result<Vec<ProfileSummary>, PipelineError> {
        self.db.list_profiles().map_err(|e| PipelineError::Failed {
            stage: Stage::Persistence,
            source: e,
        })
    }

    /// Load a full profile.
    pub fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>, PipelineError> {
        self.db
            .get_profile(profile_id)
            .map_err(|e| PipelineError::Failed {
                stage: Stage::Persistence,
                source: e,
            })
    }

    /// Delete a profile, its meetings and their media files.
    pub fn delete_profile(&self, profile_id: &str) -> Result<(), PipelineError> {
        self.db
            .delete_profile(profile_id)
            .map_err(|e| PipelineError::Failed {
                stage: Stage::Persistence,
                source: e,
            })
    }
}

/// Run a fallible stage future under a deadline and a cancellation token.
async fn bounded<F, T, E>(
    fut: F,
    timeout: Duration,
    cancel: &CancellationToken,
    stage: Stage,
) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(PipelineError::Cancelled { stage }),
        result = tokio::time::timeout(timeout, fut) => match result {
            Err(_) => Err(PipelineError::TimedOut { stage, after: timeout }),
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(PipelineError::failed(stage, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::chat::MemoryConversationStore;
    use crate::diarization::DiarizationError;
    use crate::llm::{CompletionRequest, CompletionResponse, LlmError};
    use crate::profile::PersonaProfile;
    use crate::search::{SearchData, SearchError};
    use crate::transcript::{SpeakerTurn, TranscriptSegment};
    use crate::transcription::TranscriptionError;

    struct MockTranscriber {
        segments: Vec<TranscriptSegment>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl SpeechTranscriber for MockTranscriber {
        async fn transcribe(
            &self,
            _audio_path: &Path,
            _language: Option<&str>,
        ) -> Result<Vec<TranscriptSegment>, TranscriptionError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(TranscriptionError::EngineFailed("mock failure".to_string()));
            }
            Ok(self.segments.clone())
        }
    }

    struct MockDiarizer {
        turns: Vec<SpeakerTurn>,
    }

    #[async_trait]
    impl SpeakerDiarizer for MockDiarizer {
        async fn diarize(&self, _audio_path: &Path) -> Result<Vec<SpeakerTurn>, DiarizationError> {
            Ok(self.turns.clone())
        }
    }

    struct MockLlm {
        response: String,
    }

    #[async_trait]
    impl LlmProvider for MockLlm {
        fn provider_name(&self) -> &'static str {
            "mock"
        }

        async fn is_ready(&self) -> bool {
            true
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: self.response.clone(),
                model: "mock".to_string(),
                prompt_tokens: None,
                completion_tokens: None,
            })
        }
    }

    struct MockSearch;

    #[async_trait]
    impl PersonSearch for MockSearch {
        async fn search_person(&self, _full_name: &str) -> Result<SearchData, SearchError> {
            Ok(SearchData::default())
        }
    }

    fn orchestrator(
        dir: &tempfile::TempDir,
        transcriber: MockTranscriber,
        llm_response: &str,
    ) -> Orchestrator {
        let db = Arc::new(DatabaseManager::new(dir.path().join("test.db")).unwrap());
        Orchestrator::new(
            Arc::new(transcriber),
            Arc::new(MockDiarizer {
                turns: vec![
                    SpeakerTurn::new(0.0, 2.2, "A"),
                    SpeakerTurn::new(1.0, 3.0, "B"),
                ],
            }),
            Arc::new(MockLlm {
                response: llm_response.to_string(),
            }),
            Arc::new(MockSearch),
            Arc::new(MemoryConversationStore::new()),
            db,
            PipelineConfig::default(),
        )
    }

    fn stored_profile(orchestrator: &Orchestrator) -> Profile {
        let profile = Profile::new("Ada Example", PersonaProfile::default());
        orchestrator.db.save_profile(&profile).unwrap();
        profile
    }

    const INSIGHT_RESPONSE: &str =
        "1. Key Topics:\n- testing\n\n5. Summary:\nA short mock meeting.";

    #[tokio::test]
    async fn test_analysis_stages_produce_aligned_meeting() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            &dir,
            MockTranscriber {
                segments: vec![
                    TranscriptSegment::new(0.0, 2.0, "hi"),
                    TranscriptSegment::new(1.5, 3.0, "there"),
                ],
                fail: false,
                delay: None,
            },
            INSIGHT_RESPONSE,
        );

        let cancel = CancellationToken::new();
        let meeting = orch
            .run_analysis(Path::new("/tmp/meeting.mp4"), Path::new("/tmp/audio.wav"), &cancel)
            .await
            .unwrap();

        assert_eq!(meeting.transcript[0].speaker.as_deref(), Some("A"));
        assert_eq!(meeting.transcript[1].speaker.as_deref(), Some("B"));
        assert_eq!(meeting.insights.topics, vec!["testing"]);
        assert_eq!(meeting.insights.summary, "A short mock meeting.");
        assert!(meeting.participation.speakers.contains_key("A"));
        assert!(meeting.insights.speaker_insights.contains_key("B"));
    }

    #[tokio::test]
    async fn test_failed_stage_reports_stage_and_detail() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            &dir,
            MockTranscriber {
                segments: Vec::new(),
                fail: true,
                delay: None,
            },
            INSIGHT_RESPONSE,
        );

        let cancel = CancellationToken::new();
        let err = orch
            .run_analysis(Path::new("/tmp/meeting.mp4"), Path::new("/tmp/audio.wav"), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Transcription);
        let rendered = err.to_string();
        assert!(rendered.contains("processing failed at transcription"));
        assert!(rendered.contains("mock failure"));
    }

    #[tokio::test]
    async fn test_failed_meeting_leaves_profile_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            &dir,
            MockTranscriber {
                segments: Vec::new(),
                fail: true,
                delay: None,
            },
            INSIGHT_RESPONSE,
        );
        let profile = stored_profile(&orch);

        // Invalid media fails ingestion before any stage can run
        let err = orch
            .process_meeting(&profile.id, Path::new("/nonexistent/meeting.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Ingestion);

        let stored = orch.db.get_profile(&profile.id).unwrap().unwrap();
        assert_eq!(stored, profile);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_transcription_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(
            &dir,
            MockTranscriber {
                segments: Vec::new(),
                fail: false,
                delay: Some(Duration::from_secs(3600)),
            },
            INSIGHT_RESPONSE,
        );
        orch.config.transcription_timeout = Duration::from_secs(1);

        let cancel = CancellationToken::new();
        let err = orch
            .run_analysis(Path::new("/tmp/meeting.mp4"), Path::new("/tmp/audio.wav"), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::TimedOut {
                stage: Stage::Transcription,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_stops_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            &dir,
            MockTranscriber {
                segments: Vec::new(),
                fail: false,
                delay: Some(Duration::from_secs(3600)),
            },
            INSIGHT_RESPONSE,
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = orch
            .run_analysis(Path::new("/tmp/meeting.mp4"), Path::new("/tmp/audio.wav"), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_create_profile_persists_persona() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            &dir,
            MockTranscriber {
                segments: Vec::new(),
                fail: false,
                delay: None,
            },
            r#"{"personality_traits": ["curious"], "communication_style": "direct"}"#,
        );

        let profile = orch.create_profile("Ada Example").await.unwrap();
        assert_eq!(profile.persona.personality_traits, vec!["curious"]);

        let loaded = orch.db.get_profile(&profile.id).unwrap().unwrap();
        assert_eq!(loaded, profile);
        assert_eq!(orch.list_profiles().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_requires_existing_profile() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            &dir,
            MockTranscriber {
                segments: Vec::new(),
                fail: false,
                delay: None,
            },
            "1. Main Answer:\nTalk about rowing.\n\n3. Confidence Level:\nHigh",
        );

        let err = orch.chat("missing-id", "what to say?", None).await.unwrap_err();
        assert_eq!(err.stage(), Stage::Persistence);

        let profile = stored_profile(&orch);
        let response = orch
            .chat(&profile.id, "what to say?", Some("conv-1"))
            .await
            .unwrap();
        assert_eq!(response.answer, "Talk about rowing.");
    }
}
