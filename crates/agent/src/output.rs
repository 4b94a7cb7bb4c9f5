//! Structured output parsing.
//!
//! Assistants are asked to answer in JSON, but models wrap answers in code
//! fences or prose often enough that the parse has to be forgiving.

use serde_json::{Map, Value};
use tracing::debug;

/// Parse a model answer into a JSON object.
///
/// Accepts a bare JSON object or the first ```` ```json ```` (or bare ```` ``` ````)
/// fenced block. Anything else, including a JSON value that is not an
/// object, comes back as `{"raw_response": <text>}`.
pub fn parse_structured_output(text: &str) -> Map<String, Value> {
    let candidates = [Some(text.trim()), fenced_block(text)];
    for candidate in candidates.into_iter().flatten() {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
            return map;
        }
    }

    debug!(length = text.len(), "Model output is not a JSON object, keeping raw text");
    let mut map = Map::new();
    map.insert("raw_response".into(), Value::String(text.to_string()));
    map
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let rest = &text[start + 3..];
    // Skip the info string ("json", "JSON", ...) up to the end of the line.
    let body_start = rest.find('\n')? + 1;
    let body = &rest[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_object() {
        let out = parse_structured_output(r#"  {"risks": [], "summary": "quiet week"} "#);
        assert_eq!(out["summary"], "quiet week");
    }

    #[test]
    fn fenced_json() {
        let text = "Here is the assessment:\n```json\n{\"risks\": [{\"id\": \"R-1\"}]}\n```\nLet me know.";
        let out = parse_structured_output(text);
        assert_eq!(out["risks"][0]["id"], "R-1");
        assert!(!out.contains_key("raw_response"));
    }

    #[test]
    fn plain_fence_without_language() {
        let out = parse_structured_output("```\n{\"ok\": true}\n```");
        assert_eq!(out["ok"], true);
    }

    #[test]
    fn prose_falls_back_to_raw_response() {
        let out = parse_structured_output("No risks found today.");
        assert_eq!(out.len(), 1);
        assert_eq!(out["raw_response"], "No risks found today.");
    }

    #[test]
    fn non_object_json_falls_back() {
        let out = parse_structured_output("[1, 2, 3]");
        assert_eq!(out["raw_response"], "[1, 2, 3]");
    }

    #[test]
    fn unterminated_fence_falls_back() {
        let out = parse_structured_output("```json\n{\"a\": 1}");
        assert!(out.contains_key("raw_response"));
    }
}
