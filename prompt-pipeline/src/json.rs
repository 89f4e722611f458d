use regex::Regex;
use std::sync::OnceLock;

use crate::{PipelineError, Result};

/// Slice out the first balanced `{...}` object from an LLM reply.
///
/// Prose or markdown fences around the object are ignored. Braces inside
/// JSON string literals do not count towards nesting.
pub fn extract_json_from_text(text: &str) -> Result<&str> {
    let start = text.find('{').ok_or(PipelineError::NoJsonObject)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Ok(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    Err(PipelineError::NoJsonObject)
}

/// Strip `//` and `/* */` comments and trailing commas that models like to emit
pub fn clean_and_fix_json(json_text: &str) -> String {
    static COMMENTS: OnceLock<Regex> = OnceLock::new();
    static TRAILING_COMMAS: OnceLock<Regex> = OnceLock::new();

    let comments = COMMENTS.get_or_init(|| {
        Regex::new(r"(?s)/\*.*?\*/|//[^\n]*").expect("comment pattern is valid")
    });
    let trailing_commas = TRAILING_COMMAS
        .get_or_init(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern is valid"));

    let without_comments = comments.replace_all(json_text, "");
    trailing_commas.replace_all(&without_comments, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_prose() {
        let reply = "Sure! Here is the plan:\n{\"rooms\": [{\"name\": \"Kitchen\"}]}\nLet me know.";
        assert_eq!(
            extract_json_from_text(reply).unwrap(),
            r#"{"rooms": [{"name": "Kitchen"}]}"#
        );
    }

    #[test]
    fn test_extract_json_from_markdown() {
        let reply = "```json\n{\"rooms\": []}\n```";
        assert_eq!(extract_json_from_text(reply).unwrap(), r#"{"rooms": []}"#);
    }

    #[test]
    fn test_extract_ignores_braces_in_strings() {
        let reply = r#"{"rooms": [{"name": "Den {north}"}]} trailing }"#;
        assert_eq!(
            extract_json_from_text(reply).unwrap(),
            r#"{"rooms": [{"name": "Den {north}"}]}"#
        );
    }

    #[test]
    fn test_extract_unbalanced_is_error() {
        assert!(matches!(
            extract_json_from_text("{\"rooms\": [ {\"name\": \"A\"}"),
            Err(PipelineError::NoJsonObject)
        ));
        assert!(matches!(
            extract_json_from_text("I could not find any rooms."),
            Err(PipelineError::NoJsonObject)
        ));
    }

    #[test]
    fn test_clean_removes_comments_and_trailing_commas() {
        let raw = "{\n  \"rooms\": [\n    {\"name\": \"A\", \"link\": [\"B\",],}, // first\n    /* second */ {\"name\": \"B\"},\n  ],\n}";
        let cleaned = clean_and_fix_json(raw);
        let value: serde_json::Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value["rooms"][0]["link"][0], "B");
        assert_eq!(value["rooms"][1]["name"], "B");
    }

    #[test]
    fn test_recovers_embedded_object() {
        let embedded = r#"{"rooms": [{"name": "Living", "type": "LivingRoom", "link": [], "location": "center", "size": "XL"}]}"#;
        let reply = format!(
            "Here you go:\n{}\nHope that helps!",
            embedded.replace("\"XL\"}", "\"XL\",}")
        );

        let extracted = extract_json_from_text(&reply).unwrap();
        let recovered: serde_json::Value = serde_json::from_str(&clean_and_fix_json(extracted)).unwrap();
        let expected: serde_json::Value = serde_json::from_str(embedded).unwrap();
        assert_eq!(recovered, expected);
    }
}
