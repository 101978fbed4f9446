//! JSON recovery from LLM responses.
//!
//! Models answer with raw JSON, JSON inside a markdown code fence, or
//! JSON surrounded by prose. This module digs the first balanced JSON
//! value out of whatever came back.

/// Extracts the JSON portion of a model response.
///
/// Tries, in order: a ```json fenced block, a bare fenced block, the
/// first balanced `{...}` or `[...]` region. Falls back to the trimmed
/// response so the JSON parser produces the error message.
pub fn extract_json(response: &str) -> String {
    let trimmed = response.trim();

    if let Some(json) = from_code_block(trimmed) {
        return json;
    }

    let object_start = trimmed.find('{');
    let array_start = trimmed.find('[');

    let (start, open, close) = match (object_start, array_start) {
        (Some(o), Some(a)) if a < o => (a, '[', ']'),
        (Some(o), _) => (o, '{', '}'),
        (None, Some(a)) => (a, '[', ']'),
        (None, None) => return trimmed.to_string(),
    };

    if let Some(json) = balanced_region(trimmed, start, open, close) {
        return json;
    }

    trimmed.to_string()
}

fn from_code_block(s: &str) -> Option<String> {
    for fence in ["```json\n", "```json\r\n", "```\n", "```\r\n"] {
        if let Some(start) = s.find(fence) {
            let body_start = start + fence.len();
            if let Some(end) = s[body_start..].find("```") {
                return Some(s[body_start..body_start + end].trim().to_string());
            }
        }
    }
    None
}

/// Scans from `start` for the matching close delimiter, respecting
/// string literals and escapes.
fn balanced_region(s: &str, start: usize, open: char, close: char) -> Option<String> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in s[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(s[start..start + offset + c.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
