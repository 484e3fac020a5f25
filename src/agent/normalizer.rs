//! Response normalization
//!
//! Turns whatever text the model produced into a well-formed
//! [`StructuredResult`]. The transform is pure, never fails and is
//! idempotent over its own serialized output.
//!
//! # Examples
//!
//! ```
//! use retail_assistant::agent::normalizer::{normalize, DEFAULT_FOLLOW_UP};
//!
//! let result = normalize("```json\n{\"answer\": \"Hi\"}\n```");
//! assert_eq!(result.answer, "Hi");
//!
//! let fallback = normalize("Just plain text, no JSON");
//! assert_eq!(fallback.answer, "Just plain text, no JSON");
//! assert_eq!(fallback.end.as_deref(), Some(DEFAULT_FOLLOW_UP));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Follow-up question attached when the model output had to be wrapped
pub const DEFAULT_FOLLOW_UP: &str =
    "Is there anything else I can help you with from our electronics collection?";

/// The response shape every caller receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResult {
    /// Conversational answer text
    pub answer: String,
    /// Product records surfaced by a product search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Value>>,
    /// Store records surfaced by a store lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stores: Option<Vec<Value>>,
    /// Follow-up question keeping the conversation going
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl StructuredResult {
    /// Create a result with only an answer
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            products: None,
            stores: None,
            end: None,
        }
    }

    /// Set the follow-up question
    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Set the product list
    pub fn with_products(mut self, products: Vec<Value>) -> Self {
        self.products = Some(products);
        self
    }

    /// Set the store list
    pub fn with_stores(mut self, stores: Vec<Value>) -> Self {
        self.stores = Some(stores);
        self
    }

    /// Compact JSON form
    pub fn to_json_string(&self) -> String {
        // Serializing strings and JSON values cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"answer\":{:?}}}", self.answer))
    }

    /// Read a result from an arbitrary JSON value
    ///
    /// The value must be an object with a string `answer`. Non-array
    /// `products`/`stores` and a non-string `end` are treated as absent;
    /// unknown fields are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let answer = object.get("answer")?.as_str()?.to_string();

        let list = |key: &str| object.get(key).and_then(Value::as_array).cloned();

        Some(Self {
            answer,
            products: list("products"),
            stores: list("stores"),
            end: object.get("end").and_then(Value::as_str).map(str::to_string),
        })
    }
}

/// Normalize raw model output with [`DEFAULT_FOLLOW_UP`] as the fallback follow-up
pub fn normalize(raw: &str) -> StructuredResult {
    normalize_with_follow_up(raw, DEFAULT_FOLLOW_UP)
}

/// Normalize raw model output
///
/// 1. Trim and strip one enclosing code fence.
/// 2. Parse the text as a result object.
/// 3. Otherwise parse the first balanced `{...}` span that yields one.
/// 4. Otherwise wrap the text as `{answer: text, end: follow_up}`.
///
/// Parsed objects go through a single nested-payload repair.
pub fn normalize_with_follow_up(raw: &str, follow_up: &str) -> StructuredResult {
    let text = strip_code_fence(raw.trim());

    if let Some(result) = parse_candidate(text) {
        return result;
    }

    if let Some(result) = balanced_spans(text).find_map(parse_candidate) {
        tracing::debug!("Recovered structured result from embedded JSON");
        return result;
    }

    tracing::debug!("Model output is not structured; wrapping as plain answer");
    StructuredResult::new(text).with_end(follow_up)
}

/// Parse one candidate text into a repaired result
///
/// A top-level object without an `answer` but with a valid `data` payload is
/// accepted as that payload.
fn parse_candidate(text: &str) -> Option<StructuredResult> {
    let value: Value = serde_json::from_str(text).ok()?;
    let result = StructuredResult::from_value(&value).or_else(|| data_payload(&value))?;
    Some(repair_once(result))
}

/// The valid result stored under `value.data`, if any
fn data_payload(value: &Value) -> Option<StructuredResult> {
    StructuredResult::from_value(value.get("data")?)
}

/// The result double-encoded inside `result.answer`, if any
fn nested_payload(result: &StructuredResult) -> Option<StructuredResult> {
    let inner: Value = serde_json::from_str(result.answer.trim()).ok()?;
    data_payload(&inner)
}

/// Apply the nested-payload repair at most once
///
/// The repair is skipped when the repaired result would be repairable
/// again, so a second normalization pass changes nothing.
fn repair_once(result: StructuredResult) -> StructuredResult {
    match nested_payload(&result) {
        Some(inner) if nested_payload(&inner).is_none() => {
            tracing::debug!("Repaired double-encoded model answer");
            inner
        }
        _ => result,
    }
}

/// Strip one enclosing ```` ``` ```` or ```` ```lang ```` fence
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let body = match rest.split_once('\n') {
        Some((tag, body))
            if tag
                .trim()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') =>
        {
            body
        }
        _ => rest,
    };
    let body = body.trim_end().strip_suffix("```").unwrap_or(body);
    body.trim()
}

/// Balanced `{...}` spans in order of their opening brace
///
/// Braces inside JSON strings (including escaped quotes) are ignored.
fn balanced_spans(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{')
        .filter_map(move |(start, _)| balanced_span_at(text, start))
}

fn balanced_span_at(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
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
    use serde_json::json;

    fn assert_idempotent(raw: &str) {
        let first = normalize(raw);
        let second = normalize(&first.to_json_string());
        assert_eq!(first, second, "not idempotent for {:?}", raw);
    }

    #[test]
    fn test_plain_object_is_unchanged() {
        let result = normalize(r#"{"answer":"Hi","end":"Need anything?"}"#);
        assert_eq!(result, StructuredResult::new("Hi").with_end("Need anything?"));
        assert_eq!(result.to_json_string(), r#"{"answer":"Hi","end":"Need anything?"}"#);
    }

    #[test]
    fn test_fenced_object_is_unwrapped() {
        let result = normalize("```json\n{\"answer\":\"Hi\"}\n```");
        assert_eq!(result, StructuredResult::new("Hi"));
        assert_eq!(result.to_json_string(), r#"{"answer":"Hi"}"#);

        let bare_fence = normalize("```\n{\"answer\":\"Hi\"}\n```");
        assert_eq!(bare_fence, StructuredResult::new("Hi"));
    }

    #[test]
    fn test_double_encoded_answer_is_repaired() {
        let raw = r#"{"answer":"{\"data\":{\"answer\":\"Real answer\",\"end\":\"Q?\"}}"}"#;
        let result = normalize(raw);
        assert_eq!(result, StructuredResult::new("Real answer").with_end("Q?"));
    }

    #[test]
    fn test_plain_text_falls_back() {
        let result = normalize("  Just plain text, no JSON  ");
        assert_eq!(result.answer, "Just plain text, no JSON");
        assert_eq!(result.end.as_deref(), Some(DEFAULT_FOLLOW_UP));
        assert!(result.products.is_none());
    }

    #[test]
    fn test_custom_follow_up() {
        let result = normalize_with_follow_up("hello", "Anything else?");
        assert_eq!(result.end.as_deref(), Some("Anything else?"));
    }

    #[test]
    fn test_embedded_object_is_extracted() {
        let raw = "Sure! Here you go: {\"answer\": \"Found phones {cheap}\", \"products\": [{\"name\": \"A36\"}]} Thanks";
        let result = normalize(raw);
        assert_eq!(result.answer, "Found phones {cheap}");
        assert_eq!(result.products, Some(vec![json!({"name": "A36"})]));
    }

    #[test]
    fn test_embedded_span_with_escaped_quotes() {
        let raw = r#"Result: {"answer": "He said \"}\" loudly", "end": "More?"} done"#;
        let result = normalize(raw);
        assert_eq!(result.answer, r#"He said "}" loudly"#);
        assert_eq!(result.end.as_deref(), Some("More?"));
    }

    #[test]
    fn test_inner_object_found_when_outer_is_not_a_result() {
        let raw = r#"{"response": {"answer": "inner", "stores": []}}"#;
        let result = normalize(raw);
        assert_eq!(result.answer, "inner");
        assert_eq!(result.stores, Some(vec![]));
    }

    #[test]
    fn test_top_level_data_payload() {
        let result = normalize(r#"{"status": "ok", "data": {"answer": "wrapped"}}"#);
        assert_eq!(result, StructuredResult::new("wrapped"));
    }

    #[test]
    fn test_repair_applied_only_once() {
        let innermost = json!({"data": {"answer": "deepest"}}).to_string();
        let middle = json!({"data": {"answer": innermost}}).to_string();
        let raw = json!({"answer": middle}).to_string();

        let result = normalize(&raw);
        assert_eq!(result.answer, middle);
        assert_idempotent(&raw);
    }

    #[test]
    fn test_non_array_lists_are_dropped() {
        let result = normalize(r#"{"answer": "x", "products": {"name": "tv"}, "end": 5}"#);
        assert_eq!(result, StructuredResult::new("x"));
    }

    #[test]
    fn test_unbalanced_text_falls_back() {
        let result = normalize(r#"{"answer": "never closed"#);
        assert_eq!(result.answer, r#"{"answer": "never closed"#);
        assert_eq!(result.end.as_deref(), Some(DEFAULT_FOLLOW_UP));
    }

    #[test]
    fn test_idempotence_over_varied_inputs() {
        let inputs = [
            r#"{"answer":"Hi","end":"Need anything?"}"#,
            "```json\n{\"answer\":\"Hi\"}\n```",
            r#"{"answer":"{\"data\":{\"answer\":\"Real answer\",\"end\":\"Q?\"}}"}"#,
            "Just plain text, no JSON",
            r#"{"data": {"answer": "x"}}"#,
            r#"{"answer": "{\"data\": {\"note\": 1}}"}"#,
            "```\nnot json at all\n```",
            "",
            "{}",
            r#"prefix {"answer": "a", "stores": [{"city": "Pune"}]} suffix"#,
            r#"{"answer": "```json\n{\"answer\": \"x\"}\n```"}"#,
        ];

        for raw in inputs {
            assert_idempotent(raw);
        }
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```{}```"), "{}");
        assert_eq!(strip_code_fence("no fence"), "no fence");
        assert_eq!(strip_code_fence("```json\n{}"), "{}");
        assert_eq!(strip_code_fence("```hello world```"), "hello world");
    }

    #[test]
    fn test_balanced_spans_order() {
        let spans: Vec<&str> = balanced_spans(r#"a {"x": {"y": 1}} b {"z": "}"}"#).collect();
        assert_eq!(spans, vec![r#"{"x": {"y": 1}}"#, r#"{"y": 1}"#, r#"{"z": "}"}"#]);
    }
}
