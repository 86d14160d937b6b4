// Persona generation from search data.
//
// Primary contract asks the model for a JSON object; the response tolerates
// code fences and prose wrapping, falls back to the legacy heading format,
// and finally degrades to a defaulted persona carrying the raw response.

use log::warn;

use super::{PersonaProfile, Recommendations};
use crate::llm::json::extract_json_block;
use crate::llm::sections::{section_list, section_text};
use crate::llm::{CompletionRequest, LlmError, LlmProvider};
use crate::search::SearchData;

const TRAITS_HEADING: &str = "Personality Traits:";
const STYLE_HEADING: &str = "Communication Style:";
const INTERESTS_HEADING: &str = "Key Interests:";
const BACKGROUND_HEADING: &str = "Professional Background:";
const TIPS_HEADING: &str = "Interaction Recommendations:";
const AVOID_HEADING: &str = "Topics to Avoid:";
const STARTERS_HEADING: &str = "Conversation Starters:";

/// Serialize search data into the context block for persona generation.
pub fn prepare_context(search_data: &SearchData, full_name: &str) -> String {
    let mut context = format!("Information about {}:\n\n", full_name);

    if !search_data.social_profiles.is_empty() {
        context.push_str("Social Media Profiles:\n");
        for profile in &search_data.social_profiles {
            context.push_str(&format!(
                "- {}: {}\n",
                profile.platform,
                profile.snippet.as_deref().unwrap_or("")
            ));
        }
    }

    let prof = &search_data.professional_info;
    if prof.current_position.is_some() || prof.company.is_some() {
        context.push_str("\nProfessional Information:\n");
        if let Some(position) = &prof.current_position {
            context.push_str(&format!("- Current Position: {}\n", position));
        }
        if let Some(company) = &prof.company {
            context.push_str(&format!("- Company: {}\n", company));
        }
    }

    if !search_data.news_articles.is_empty() {
        context.push_str("\nRecent News:\n");
        for article in search_data.news_articles.iter().take(3) {
            context.push_str(&format!(
                "- {}: {}\n",
                article.title,
                article.snippet.as_deref().unwrap_or("")
            ));
        }
    }

    context
}

fn build_prompt(context: &str, full_name: &str) -> String {
    format!(
        "Based on the following information about {}, generate a comprehensive personality \
         and behavioral profile. Focus on identifying key personality traits, communication \
         style, interests, and professional background. Also provide specific recommendations \
         for how to interact with this person effectively.\n\n\
         Information:\n{}\n\n\
         Respond with a single JSON object matching this structure exactly:\n\
         {{\n\
           \"personality_traits\": [\"list of traits\"],\n\
           \"communication_style\": \"description\",\n\
           \"interests\": [\"list of interests\"],\n\
           \"professional_background\": \"description\",\n\
           \"recommendations\": {{\n\
             \"interaction_tips\": [\"list of tips\"],\n\
             \"topics_to_avoid\": [\"list of topics\"],\n\
             \"conversation_starters\": [\"list of openers\"]\n\
           }}\n\
         }}\n\n\
         Be specific and actionable in your recommendations. If certain information is not \
         available, use empty values rather than inventing facts.",
        full_name, context
    )
}

/// Parse a persona response: JSON first (fenced or prose-wrapped tolerated),
/// then the legacy heading format, then a defaulted persona with the raw
/// response in `error`. Never fails.
pub fn parse_persona_response(response: &str) -> PersonaProfile {
    if let Some(value) = extract_json_block(response) {
        if let Ok(persona) = serde_json::from_value::<PersonaProfile>(value) {
            return persona;
        }
    }

    let persona = PersonaProfile {
        personality_traits: section_list(response, TRAITS_HEADING),
        communication_style: section_text(response, STYLE_HEADING),
        interests: section_list(response, INTERESTS_HEADING),
        professional_background: section_text(response, BACKGROUND_HEADING),
        recommendations: Recommendations {
            interaction_tips: section_list(response, TIPS_HEADING),
            topics_to_avoid: section_list(response, AVOID_HEADING),
            conversation_starters: section_list(response, STARTERS_HEADING),
        },
        error: None,
    };

    let nothing_recognized = persona.personality_traits.is_empty()
        && persona.communication_style.is_empty()
        && persona.interests.is_empty()
        && persona.professional_background.is_empty()
        && persona.recommendations == Recommendations::default();

    if nothing_recognized {
        warn!("Persona response had no recognizable structure, keeping raw text");
        return PersonaProfile {
            error: Some(response.to_string()),
            ..PersonaProfile::default()
        };
    }

    persona
}

/// Generate a persona for `full_name` from search data via one LLM call.
pub async fn generate_persona(
    provider: &dyn LlmProvider,
    search_data: &SearchData,
    full_name: &str,
) -> Result<PersonaProfile, LlmError> {
    let context = prepare_context(search_data, full_name);
    let prompt = build_prompt(&context, full_name);

    let response = provider
        .complete(CompletionRequest::new(vec![crate::llm::Message::user(prompt)]))
        .await?;

    Ok(parse_persona_response(&response.content))
}
