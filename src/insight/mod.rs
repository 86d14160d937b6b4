// Meeting insight synthesis: serialize the aligned transcript and
// participation stats into a context block, ask the LLM for a structured
// analysis, and parse the loosely formatted response back into fields.

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::analysis::{InteractionProfile, ParticipationSummary};
use crate::llm::sections::{section_list, section_text};
use crate::llm::{CompletionRequest, LlmError, LlmProvider};
use crate::transcript::TranscriptSegment;

const TOPICS_HEADING: &str = "Key Topics:";
const ACTION_ITEMS_HEADING: &str = "Action Items:";
const KEY_POINTS_HEADING: &str = "Key Discussion Points:";
const SENTIMENT_HEADING: &str = "Meeting Sentiment:";
const SUMMARY_HEADING: &str = "Summary:";

/// Structured insights for one meeting. Defaults stand in for anything the
/// LLM response did not carry; `error` holds the raw response when nothing
/// recognizable came back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MeetingInsights {
    pub topics: Vec<String>,
    pub action_items: Vec<String>,
    pub key_points: Vec<String>,
    pub sentiment: String,
    pub summary: String,
    /// Locally derived per-speaker interaction patterns
    #[serde(default)]
    pub speaker_insights: HashMap<String, InteractionProfile>,
    /// Raw response preserved when parsing failed entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Serialize the transcript and participation summary into the
/// natural-language context block the analysis prompt embeds.
pub fn build_context(transcript: &[TranscriptSegment], summary: &ParticipationSummary) -> String {
    let mut context = String::from("Meeting Transcript:\n\n");

    for segment in transcript {
        context.push_str(&format!(
            "[{}] ({:.1}s - {:.1}s): {}\n",
            segment.speaker_or_unknown(),
            segment.start,
            segment.end,
            segment.text
        ));
    }

    context.push_str("\nSpeaker Participation Summary:\n");
    let mut speakers: Vec<_> = summary.speakers.iter().collect();
    speakers.sort_by(|a, b| a.0.cmp(b.0));
    for (speaker, stats) in speakers {
        context.push_str(&format!(
            "- {}: {:.1}% of meeting time, {} words\n",
            speaker, stats.percentage, stats.total_words
        ));
    }

    context
}

fn build_prompt(context: &str) -> String {
    format!(
        "Analyze the following meeting transcript and provide a comprehensive analysis.\n\
         Focus on identifying key topics, action items, deadlines, and overall sentiment.\n\n\
         {}\n\n\
         Please structure your response in the following format:\n\n\
         1. Key Topics:\n\
         - List the main topics discussed\n\
         - Include brief context for each topic\n\n\
         2. Action Items:\n\
         - List all action items mentioned\n\
         - Include who is responsible and any deadlines\n\
         - Note any commitments made\n\n\
         3. Key Discussion Points:\n\
         - List the most important points discussed\n\
         - Include any decisions made\n\
         - Note any areas of agreement or disagreement\n\n\
         4. Meeting Sentiment:\n\
         - Overall tone of the meeting\n\
         - Any notable emotional moments\n\
         - Level of engagement\n\n\
         5. Summary:\n\
         - Brief overview of the meeting\n\
         - Main outcomes\n\
         - Next steps\n\n\
         Be specific and actionable in your analysis. If certain information is not \
         available, indicate that in your response.",
        context
    )
}

/// Parse the LLM's heading-structured response. Unrecognized sections are
/// dropped; missing sections keep their defaults; a response with no
/// recognizable section at all comes back fully defaulted with the raw text
/// in `error`. Never fails.
pub fn parse_insight_response(response: &str) -> MeetingInsights {
    let mut insights = MeetingInsights {
        topics: section_list(response, TOPICS_HEADING),
        action_items: section_list(response, ACTION_ITEMS_HEADING),
        key_points: section_list(response, KEY_POINTS_HEADING),
        sentiment: section_text(response, SENTIMENT_HEADING),
        summary: section_text(response, SUMMARY_HEADING),
        ..MeetingInsights::default()
    };

    let nothing_recognized = insights.topics.is_empty()
        && insights.action_items.is_empty()
        && insights.key_points.is_empty()
        && insights.sentiment.is_empty()
        && insights.summary.is_empty();

    if nothing_recognized && !response.trim().is_empty() {
        warn!("Insight response had no recognizable sections, keeping raw text");
        insights.error = Some(response.to_string());
    }

    insights
}

/// Run the full synthesis step: context → LLM → parsed insights, with the
/// locally derived speaker interaction profiles attached.
///
/// An LLM transport failure is returned as an error; a malformed response is
/// not — it degrades per `parse_insight_response`.
pub async fn synthesize(
    provider: &dyn LlmProvider,
    transcript: &[TranscriptSegment],
    summary: &ParticipationSummary,
    interactions: HashMap<String, InteractionProfile>,
) -> Result<MeetingInsights, LlmError> {
    let context = build_context(transcript, summary);
    let prompt = build_prompt(&context);

    let response = provider
        .complete(CompletionRequest::new(vec![crate::llm::Message::user(prompt)]))
        .await?;

    let mut insights = parse_insight_response(&response.content);
    insights.speaker_insights = interactions;
    Ok(insights)
}
