// JSON extraction from LLM responses.
//
// Models asked for JSON routinely wrap it in code fences or prose; callers
// strip the fences first and fall back to the first balanced object when
// direct parsing fails.

use once_cell::sync::Lazy;
use regex::Regex;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid regex"));

/// Extract the most plausible JSON object text from an LLM response.
///
/// Tries, in order: the response as-is (trimmed), the contents of the first
/// code fence, and the first balanced `{...}` block. Returns `None` when no
/// candidate parses as JSON.
pub fn extract_json_block(response: &str) -> Option<serde_json::Value> {
    let trimmed = response.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(captures) = CODE_FENCE.captures(trimmed) {
        if let Ok(value) = serde_json::from_str(captures[1].trim()) {
            return Some(value);
        }
    }

    first_balanced_object(trimmed).and_then(|block| serde_json::from_str(block).ok())
}

/// Find the first balanced `{...}` block, respecting string literals and
/// escapes.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json() {
        let value = extract_json_block(r#"{"answer": 42}"#).unwrap();
        assert_eq!(value["answer"], 42);
    }

    #[test]
    fn test_code_fenced_json() {
        let response = "Here you go:\n```json\n{\"answer\": 42}\n```\nAnything else?";
        let value = extract_json_block(response).unwrap();
        assert_eq!(value["answer"], 42);
    }

    #[test]
    fn test_bare_fence_json() {
        let response = "```\n{\"ok\": true}\n```";
        let value = extract_json_block(response).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_prose_wrapped_json() {
        let response = "The profile is {\"name\": \"Ada\", \"tags\": [\"math\"]} as requested.";
        let value = extract_json_block(response).unwrap();
        assert_eq!(value["name"], "Ada");
    }

    #[test]
    fn test_nested_braces_and_strings() {
        let response = r#"note {"outer": {"inner": "has } brace"}, "n": 1} trailing"#;
        let value = extract_json_block(response).unwrap();
        assert_eq!(value["outer"]["inner"], "has } brace");
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn test_no_json_returns_none() {
        assert!(extract_json_block("I could not produce a profile.").is_none());
    }

    #[test]
    fn test_unbalanced_braces_return_none() {
        assert!(extract_json_block("{\"oops\": ").is_none());
    }
}
