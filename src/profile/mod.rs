// Profile domain model: the per-person record, its meetings, and the
// LLM-generated persona.

pub mod writer;

pub use writer::generate_persona;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::analysis::ParticipationSummary;
use crate::insight::MeetingInsights;
use crate::transcript::TranscriptSegment;

/// Guidance for interacting with a person, generated alongside the persona
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Recommendations {
    #[serde(default)]
    pub interaction_tips: Vec<String>,
    #[serde(default)]
    pub topics_to_avoid: Vec<String>,
    #[serde(default)]
    pub conversation_starters: Vec<String>,
}

/// LLM-generated personality and communication attributes for a person.
/// Every field defaults so partially parsed responses still deserialize;
/// `error` carries the raw response when nothing could be parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PersonaProfile {
    #[serde(default)]
    pub personality_traits: Vec<String>,
    #[serde(default)]
    pub communication_style: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub professional_background: String,
    #[serde(default)]
    pub recommendations: Recommendations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One analyzed meeting owned by a profile. Appended, never mutated in
/// place; re-analysis of the same media creates a new Meeting so history is
/// preserved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meeting {
    pub id: String,
    pub recorded_at: DateTime<Utc>,
    /// The source media file this meeting was analyzed from
    pub media_path: PathBuf,
    pub transcript: Vec<TranscriptSegment>,
    pub participation: ParticipationSummary,
    pub insights: MeetingInsights,
}

impl Meeting {
    pub fn new(
        media_path: PathBuf,
        transcript: Vec<TranscriptSegment>,
        participation: ParticipationSummary,
        insights: MeetingInsights,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            media_path,
            transcript,
            participation,
            insights,
        }
    }
}

/// The per-person record: unit of persistence and deletion. Meetings are
/// kept in insertion order, which is chronological.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub persona: PersonaProfile,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
}

impl Profile {
    pub fn new(full_name: impl Into<String>, persona: PersonaProfile) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.into(),
            created_at: Utc::now(),
            persona,
            meetings: Vec::new(),
        }
    }

    /// The most recently appended meeting, if any.
    pub fn latest_meeting(&self) -> Option<&Meeting> {
        self.meetings.last()
    }
}

/// Listing-friendly view of a profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileSummary {
    pub id: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub meeting_count: usize,
}
