// Heading-based parsing of loosely structured LLM responses.
//
// Responses are segmented on blank-line boundaries and blocks are matched by
// literal heading prefixes ("Key Topics:", "Action Items:", ...). Unknown
// sections are dropped; missing sections leave their field at its default.
// Best-effort by design: well-formed output maps losslessly, malformed output
// degrades instead of crashing.

/// Find the block containing `heading` and return the text after it, trimmed.
/// Returns `None` when no block mentions the heading.
pub fn find_section(response: &str, heading: &str) -> Option<String> {
    for section in response.split("\n\n") {
        if let Some(idx) = section.find(heading) {
            return Some(section[idx + heading.len()..].trim().to_string());
        }
    }
    None
}

/// Split a section body into list items: one per non-empty line, with any
/// leading "- " bullet stripped.
pub fn parse_list(body: &str) -> Vec<String> {
    body.lines()
        .map(|line| line.trim().trim_start_matches('-').trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

/// Convenience: find a section and parse it as a list, or empty when absent.
pub fn section_list(response: &str, heading: &str) -> Vec<String> {
    find_section(response, heading)
        .map(|body| parse_list(&body))
        .unwrap_or_default()
}

/// Convenience: find a section as free text, or empty when absent.
pub fn section_text(response: &str, heading: &str) -> String {
    find_section(response, heading).unwrap_or_default()
}
