// Chat agent: answers questions about a person from their persona, latest
// meeting insights and recent conversation history.
//
// Conversation history lives behind an injected store rather than
// process-wide state, so callers own retention and sharing.

use std::fmt;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::insight::MeetingInsights;
use crate::llm::sections::{section_list, section_text};
use crate::llm::{CompletionRequest, LlmError, LlmProvider};
use crate::profile::PersonaProfile;

/// Number of past exchanges included in the prompt context
const HISTORY_WINDOW: usize = 3;

/// One past question/answer exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationEntry {
    pub query: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Externally owned conversation history, keyed by conversation id.
pub trait ConversationStore: Send + Sync {
    fn get(&self, conversation_id: &str) -> Vec<ConversationEntry>;
    fn append(&self, conversation_id: &str, entry: ConversationEntry);
    fn clear(&self, conversation_id: &str);
}

/// In-memory conversation store for callers without their own persistence
#[derive(Default)]
pub struct MemoryConversationStore {
    conversations: DashMap<String, Vec<ConversationEntry>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryConversationStore {
    fn get(&self, conversation_id: &str) -> Vec<ConversationEntry> {
        self.conversations
            .get(conversation_id)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    fn append(&self, conversation_id: &str, entry: ConversationEntry) {
        self.conversations
            .entry(conversation_id.to_string())
            .or_default()
            .push(entry);
    }

    fn clear(&self, conversation_id: &str) {
        self.conversations.remove(conversation_id);
    }
}

/// Confidence the agent reports for an answer
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "High"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::Low => write!(f, "Low"),
        }
    }
}

/// Structured chat answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub answer: String,
    pub suggestions: Vec<String>,
    pub confidence: Confidence,
}

/// Chat agent over an LLM provider and an injected conversation store
pub struct ChatAgent<'a> {
    provider: &'a dyn LlmProvider,
    store: &'a dyn ConversationStore,
}

impl<'a> ChatAgent<'a> {
    pub fn new(provider: &'a dyn LlmProvider, store: &'a dyn ConversationStore) -> Self {
        Self { provider, store }
    }

    /// Answer a query about a person. History is read from and appended to
    /// the store only when a conversation id is given.
    pub async fn process_query(
        &self,
        query: &str,
        persona: Option<&PersonaProfile>,
        meeting_insights: Option<&MeetingInsights>,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, LlmError> {
        let history = conversation_id
            .map(|id| self.store.get(id))
            .unwrap_or_default();

        let context = prepare_context(query, persona, meeting_insights, &history);
        let prompt = build_prompt(&context);

        let completion = self
            .provider
            .complete(CompletionRequest::new(vec![crate::llm::Message::user(prompt)]))
            .await?;

        let response = parse_chat_response(&completion.content);

        if let Some(id) = conversation_id {
            self.store.append(
                id,
                ConversationEntry {
                    query: query.to_string(),
                    response: response.answer.clone(),
                    timestamp: Utc::now(),
                },
            );
        }

        Ok(response)
    }
}

fn prepare_context(
    query: &str,
    persona: Option<&PersonaProfile>,
    meeting_insights: Option<&MeetingInsights>,
    history: &[ConversationEntry],
) -> String {
    let mut context = format!("User Query:\n{}\n\n", query);

    if let Some(persona) = persona {
        context.push_str("Profile Information:\n");
        if !persona.personality_traits.is_empty() {
            context.push_str(&format!(
                "Personality Traits: {}\n",
                persona.personality_traits.join(", ")
            ));
        }
        if !persona.communication_style.is_empty() {
            context.push_str(&format!(
                "Communication Style: {}\n",
                persona.communication_style
            ));
        }
        if !persona.interests.is_empty() {
            context.push_str(&format!("Interests: {}\n", persona.interests.join(", ")));
        }
        let recs = &persona.recommendations;
        if !recs.interaction_tips.is_empty()
            || !recs.topics_to_avoid.is_empty()
            || !recs.conversation_starters.is_empty()
        {
            context.push_str("Recommendations:\n");
            if !recs.interaction_tips.is_empty() {
                context.push_str(&format!(
                    "- interaction_tips: {}\n",
                    recs.interaction_tips.join(", ")
                ));
            }
            if !recs.topics_to_avoid.is_empty() {
                context.push_str(&format!(
                    "- topics_to_avoid: {}\n",
                    recs.topics_to_avoid.join(", ")
                ));
            }
            if !recs.conversation_starters.is_empty() {
                context.push_str(&format!(
                    "- conversation_starters: {}\n",
                    recs.conversation_starters.join(", ")
                ));
            }
        }
    }

    if let Some(insights) = meeting_insights {
        context.push_str("\nMeeting Information:\n");
        if !insights.topics.is_empty() {
            context.push_str(&format!(
                "Topics Discussed: {}\n",
                insights.topics.join(", ")
            ));
        }
        if !insights.action_items.is_empty() {
            context.push_str("Action Items:\n");
            for item in &insights.action_items {
                context.push_str(&format!("- {}\n", item));
            }
        }
        if !insights.sentiment.is_empty() {
            context.push_str(&format!("Meeting Sentiment: {}\n", insights.sentiment));
        }
    }

    if !history.is_empty() {
        context.push_str("\nPrevious Conversation:\n");
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        for entry in &history[start..] {
            context.push_str(&format!("User: {}\n", entry.query));
            context.push_str(&format!("Assistant: {}\n", entry.response));
        }
    }

    context
}

fn build_prompt(context: &str) -> String {
    format!(
        "Based on the following context, provide a helpful and personalized response.\n\
         Focus on being specific, actionable, and considerate of the person's communication \
         style and preferences.\n\n\
         {}\n\n\
         Please structure your response in the following format:\n\n\
         1. Main Answer:\n\
         - Direct response to the query\n\
         - Specific recommendations or insights\n\
         - Any relevant warnings or considerations\n\n\
         2. Related Suggestions:\n\
         - Additional topics to consider\n\
         - Follow-up questions that might be helpful\n\
         - Alternative approaches if applicable\n\n\
         3. Confidence Level:\n\
         - High: Very confident in the response\n\
         - Medium: Some uncertainty but reasonable confidence\n\
         - Low: Limited information available\n\n\
         Be honest about the confidence level and any limitations in the available \
         information.",
        context
    )
}

/// Parse the agent's heading-structured response; missing sections keep
/// defaults and confidence falls back to Medium.
pub fn parse_chat_response(response: &str) -> ChatResponse {
    let answer = section_text(response, "Main Answer:");
    let suggestions = section_list(response, "Related Suggestions:");

    let confidence_text = section_text(response, "Confidence Level:");
    let confidence = if confidence_text.starts_with("High") {
        Confidence::High
    } else if confidence_text.starts_with("Low") {
        Confidence::Low
    } else {
        Confidence::Medium
    };

    ChatResponse {
        // Fall back to the whole response when the model skipped the format
        answer: if answer.is_empty() {
            response.trim().to_string()
        } else {
            answer
        },
        suggestions,
        confidence,
    }
}
