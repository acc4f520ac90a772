//! Salvage parser for model output.
//!
//! Models asked for JSON still wrap it in markdown fences or stray
//! prose often enough that a strict parse alone loses real work. The
//! parse order is: strip fences, strict parse, then slice between the
//! first `{` and last `}` and retry. Anything that survives none of
//! those is a stage failure.

use serde::de::DeserializeOwned;

use crate::error::LlmError;

/// Parse JSON-shaped model text into `T`.
pub fn parse_llm_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let cleaned = strip_fences(text);

    match serde_json::from_str::<T>(&cleaned) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            // Salvage: take the outermost brace-delimited span.
            if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}'))
                && start < end
                && let Ok(value) = serde_json::from_str::<T>(&cleaned[start..=end])
            {
                return Ok(value);
            }
            Err(LlmError::Parse(format!(
                "model did not return valid JSON: {strict_err}"
            )))
        }
    }
}

/// Remove markdown code fences (```json ... ``` or ``` ... ```) and
/// stray backticks around the payload.
fn strip_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        // Drop a language tag directly after the opening fence.
        for tag in ["json", "JSON"] {
            if let Some(stripped) = rest.strip_prefix(tag) {
                rest = stripped;
                break;
            }
        }
    }
    out.push_str(rest);
    out.trim().trim_matches('`').trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        answer: String,
    }

    #[test]
    fn parses_plain_json() {
        let parsed: Payload = parse_llm_json(r#"{"answer": "yes"}"#).unwrap();
        assert_eq!(parsed.answer, "yes");
    }

    #[test]
    fn parses_json_fenced_with_language_tag() {
        let text = "```json\n{\"answer\": \"fenced\"}\n```";
        let parsed: Payload = parse_llm_json(text).unwrap();
        assert_eq!(parsed.answer, "fenced");
    }

    #[test]
    fn parses_json_with_plain_fences() {
        let text = "```\n{\"answer\": \"plain\"}\n```";
        let parsed: Payload = parse_llm_json(text).unwrap();
        assert_eq!(parsed.answer, "plain");
    }

    #[test]
    fn salvages_json_wrapped_in_prose() {
        let text = "Sure! Here is the result: {\"answer\": \"salvaged\"} Hope this helps.";
        let parsed: Payload = parse_llm_json(text).unwrap();
        assert_eq!(parsed.answer, "salvaged");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let result = parse_llm_json::<Payload>("this is not json at all");
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[test]
    fn wrong_shape_is_a_parse_error() {
        let result = parse_llm_json::<Payload>(r#"{"different_key": 1}"#);
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[test]
    fn unbalanced_braces_fail() {
        let result = parse_llm_json::<Payload>("}{");
        assert!(result.is_err());
    }
}
