use crate::llm::LlmError;
use serde_json::Value;

const FENCE: &str = "```";

/// Returns the body of the first Markdown code fence in `text`, with any language
/// tag (```json) dropped. `None` when the text has no fence.
pub fn extract_fenced(text: &str) -> Option<&str> {
    let start = text.find(FENCE)? + FENCE.len();
    let rest = &text[start..];
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let body = &rest[tag_len..];
    let body = match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    };
    Some(body.trim())
}

pub fn extract_json(text: &str) -> &str {
    extract_fenced(text).unwrap_or_else(|| text.trim())
}

pub fn parse_json(text: &str) -> Result<Value, LlmError> {
    let json_str = extract_json(text);
    serde_json::from_str::<Value>(json_str).map_err(|source| LlmError::Parse {
        source,
        raw_output: text.to_string(),
    })
}

/// Falsy payloads (`null`, `false`, `""`, `[]`, `{}`) carry no evaluation.
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let body = "{\"a\":1}";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json(&fenced), body);
    }

    #[test]
    fn extract_json_handles_fence_after_prose() {
        let text = "Here is the evaluation:\n```json\n[{\"name\": \"Apple\"}]\n```\nThanks.";
        assert_eq!(extract_json(text), "[{\"name\": \"Apple\"}]");
    }

    #[test]
    fn extract_json_handles_untagged_single_line_fence() {
        assert_eq!(extract_json("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn extract_json_trims_unfenced_text() {
        assert_eq!(extract_json("  \n{\"a\":1}\n "), "{\"a\":1}");
    }

    #[test]
    fn fenced_and_plain_parse_identically() {
        let plain = "{\"symbol\":\"MSFT\",\"scores\":[1,2]}";
        let fenced = format!("```json\n{plain}\n```");
        assert_eq!(parse_json(plain).unwrap(), parse_json(&fenced).unwrap());
    }

    #[test]
    fn parse_json_rejects_malformed_output() {
        let err = parse_json("{\"symbol\": \"MSFT\",").unwrap_err();
        assert!(matches!(err, LlmError::Parse { .. }));
        assert_eq!(err.raw_output(), Some("{\"symbol\": \"MSFT\","));
    }

    #[test]
    fn empty_payloads_are_detected() {
        assert!(is_empty_payload(&json!(null)));
        assert!(is_empty_payload(&json!({})));
        assert!(is_empty_payload(&json!([])));
        assert!(is_empty_payload(&json!("")));
        assert!(!is_empty_payload(&json!({"a": 1})));
        assert!(!is_empty_payload(&json!([{}])));
    }
}
