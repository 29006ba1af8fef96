//! Classification normalizer.
//!
//! Turns whatever the classifier produced into a [`ClassificationResult`].
//! Nothing here fails: malformed payloads and failed calls both degrade to
//! [`ClassificationResult::fallback`] with a diagnostic rationale.

use serde_json::Value;
use std::num::IntErrorKind;
use std::time::Duration;
use thiserror::Error;

use crate::types::{ClassificationResult, Intent, Slots};

/// Characters of the raw payload kept in a parse-failure rationale.
pub const RAW_EXCERPT_CHARS: usize = 100;

/// Failure of the upstream classification call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("classifier transport error: {0}")]
    Transport(String),

    #[error("classifier returned an empty response")]
    EmptyResponse,

    #[error("classifier rejected the request (exit code {code:?}): {detail}")]
    Rejected { code: Option<i32>, detail: String },
}

/// Normalize a raw classifier payload.
pub fn normalize(raw: &str) -> ClassificationResult {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => normalize_value(&value),
        Ok(_) => ClassificationResult::fallback(format!(
            "classifier output is not a JSON object, raw output: {}",
            excerpt(raw)
        )),
        Err(_) => ClassificationResult::fallback(format!(
            "failed to parse classifier JSON, raw output: {}",
            excerpt(raw)
        )),
    }
}

/// Normalize an already-parsed payload.
///
/// A JSON string is treated as raw classifier text and parsed again, which is
/// how datasets embed verbatim model output.
pub fn normalize_value(value: &Value) -> ClassificationResult {
    let obj = match value {
        Value::Object(obj) => obj,
        Value::String(raw) => return normalize(raw),
        other => {
            return ClassificationResult::fallback(format!(
                "classifier output is not a JSON object, raw output: {}",
                excerpt(&other.to_string())
            ))
        }
    };

    let intent = obj
        .get("intent")
        .and_then(Value::as_str)
        .and_then(|label| label.parse::<Intent>().ok())
        .unwrap_or(Intent::Chat);

    let score = obj.get("score").map(coerce_score).unwrap_or(0);

    let slots = match obj.get("slots") {
        Some(Value::Object(slots)) => slots.clone(),
        _ => Slots::new(),
    };

    let rationale = match obj.get("reason") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(reason)) => reason.clone(),
        Some(other) => other.to_string(),
    };

    ClassificationResult::new(intent, score, slots, rationale)
}

/// Fold the outcome of a classifier call into a usable result.
pub fn normalize_outcome(outcome: Result<String, ClassifierError>) -> ClassificationResult {
    match outcome {
        Ok(raw) => normalize(&raw),
        Err(err) => ClassificationResult::fallback(format!("classifier call failed: {}", err)),
    }
}

/// Integer coercion of a score field; anything unusable becomes 0.
fn coerce_score(value: &Value) -> i64 {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if n.as_u64().is_some() {
                i64::MAX
            } else {
                n.as_f64().map(|f| f.trunc() as i64).unwrap_or(0)
            }
        }
        Value::String(s) => parse_integer_saturating(s.trim()),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

/// Integer text saturates on overflow; anything else is 0.
fn parse_integer_saturating(text: &str) -> i64 {
    match text.parse::<i64>() {
        Ok(i) => i,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 0,
        },
    }
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(RAW_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConfidenceTier;
    use serde_json::json;

    #[test]
    fn test_well_formed_payload() {
        let result = normalize(
            r#"{"intent": "recite", "score": 72, "slots": {"poem": "静夜思"}, "reason": "asks to recite"}"#,
        );
        assert_eq!(result.intent, Intent::Recite);
        assert_eq!(result.score(), 72);
        assert_eq!(result.confidence_tier(), ConfidenceTier::Mid);
        assert_eq!(result.slots["poem"], "静夜思");
        assert_eq!(result.rationale, "asks to recite");
    }

    #[test]
    fn test_unparseable_payload_falls_back() {
        let result = normalize("sure! here is the intent: homework");
        assert_eq!(result.intent, Intent::Chat);
        assert_eq!(result.score(), 0);
        assert_eq!(result.confidence_tier(), ConfidenceTier::Low);
        assert!(result.slots.is_empty());
        assert!(result.rationale.contains("sure! here is the intent"));
    }

    #[test]
    fn test_parse_failure_excerpt_is_capped() {
        let raw = "x".repeat(500);
        let result = normalize(&raw);
        let tail: String = result.rationale.chars().rev().take_while(|c| *c == 'x').collect();
        assert_eq!(tail.len(), RAW_EXCERPT_CHARS);
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let raw = "作".repeat(150);
        let result = normalize(&raw);
        assert_eq!(result.rationale.matches('作').count(), RAW_EXCERPT_CHARS);
    }

    #[test]
    fn test_non_object_json_falls_back() {
        for raw in ["[1, 2, 3]", "42", "\"homework\"", "null"] {
            let result = normalize(raw);
            assert_eq!(result.intent, Intent::Chat, "payload {raw}");
            assert_eq!(result.confidence_tier(), ConfidenceTier::Low);
        }
    }

    #[test]
    fn test_unknown_or_missing_intent_is_chat() {
        for payload in [
            json!({"intent": "dance", "score": 90}),
            json!({"intent": "HOMEWORK", "score": 90}),
            json!({"intent": null, "score": 90}),
            json!({"intent": 3, "score": 90}),
            json!({"score": 90}),
        ] {
            let result = normalize_value(&payload);
            assert_eq!(result.intent, Intent::Chat, "payload {payload}");
            assert_eq!(result.score(), 90);
        }
    }

    #[test]
    fn test_score_coercion() {
        let cases = [
            (json!(85), 85),
            (json!("85"), 85),
            (json!(" 60 "), 60),
            (json!(85.9), 85),
            (json!("85.5"), 0),
            (json!("high"), 0),
            (json!(null), 0),
            (json!(true), 1),
            (json!([90]), 0),
            (json!(-15), 0),
            (json!(140), 100),
            (json!(u64::MAX), 100),
            (json!(-1e30), 0),
            (json!("99999999999999999999"), 100),
            (json!(" +99999999999999999999 "), 100),
            (json!("-99999999999999999999"), 0),
            (json!("9999999999999999999x"), 0),
        ];
        for (score, expected) in cases {
            let result = normalize_value(&json!({"intent": "chat", "score": score}));
            assert_eq!(result.score(), expected, "score {score}");
        }
    }

    #[test]
    fn test_oversized_integer_string_clamps_high() {
        let result = normalize(r#"{"intent": "homework", "score": "99999999999999999999"}"#);
        assert_eq!(result.score(), 100);
        assert_eq!(result.confidence_tier(), ConfidenceTier::High);
    }

    #[test]
    fn test_self_reported_confidence_is_ignored() {
        let result = normalize_value(&json!({
            "intent": "homework",
            "score": 30,
            "confidence": "HIGH",
        }));
        assert_eq!(result.confidence_tier(), ConfidenceTier::Low);

        let result = normalize_value(&json!({
            "intent": "homework",
            "score": 95,
            "confidence": "LOW",
        }));
        assert_eq!(result.confidence_tier(), ConfidenceTier::High);
    }

    #[test]
    fn test_slots_and_reason_defaults() {
        let result = normalize_value(&json!({"intent": "chat", "score": 10, "slots": null}));
        assert!(result.slots.is_empty());
        assert_eq!(result.rationale, "");

        let result = normalize_value(&json!({"intent": "chat", "slots": ["a"], "reason": 12}));
        assert!(result.slots.is_empty());
        assert_eq!(result.rationale, "12");
    }

    #[test]
    fn test_embedded_string_payload_is_reparsed() {
        let result = normalize_value(&json!("{\"intent\": \"exit_current\", \"score\": \"99\"}"));
        assert_eq!(result.intent, Intent::Exit);
        assert_eq!(result.score(), 99);
    }

    #[test]
    fn test_failed_call_falls_back() {
        let result = normalize_outcome(Err(ClassifierError::Timeout(Duration::from_secs(10))));
        assert_eq!(result.intent, Intent::Chat);
        assert_eq!(result.score(), 0);
        assert_eq!(result.confidence_tier(), ConfidenceTier::Low);
        assert!(result.rationale.contains("timed out"));

        let result = normalize_outcome(Err(ClassifierError::EmptyResponse));
        assert!(result.rationale.contains("empty response"));
    }

    #[test]
    fn test_successful_call_is_normalized() {
        let result = normalize_outcome(Ok(r#"{"intent": "continue_current", "score": 58}"#.into()));
        assert_eq!(result.intent, Intent::Continue);
        assert_eq!(result.confidence_tier(), ConfidenceTier::Mid);
    }
}
