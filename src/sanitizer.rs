// 🧹 Response Sanitizer - Extract well-formed JSON from free-text AI replies
// The upstream text is AI-generated prose, not a guaranteed contract, so
// this boundary is heuristic by design and strictly fail-soft: one bad
// reply must never abort the whole request.

use crate::rules::RuleCandidate;
use serde_json::Value;

/// Strip markdown code-fence markers (``` and ```json) from a raw reply
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Extract a rule-candidate list from a raw LLM reply.
///
/// Accepts three shapes, each normalized to a list:
/// - an object with a `rules` array field
/// - a bare array
/// - a single object
///
/// Any parse failure or unexpected structure yields an empty list.
pub fn sanitize_rules(raw: &str) -> Vec<RuleCandidate> {
    let clean = strip_code_fences(raw);

    let parsed: Value = match serde_json::from_str(&clean) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("⚠️  JSON parsing error in extraction reply: {}", err);
            return Vec::new();
        }
    };

    let items: Vec<Value> = if let Some(rules) = parsed.get("rules") {
        match rules {
            Value::Array(rules) => rules.clone(),
            _ => {
                eprintln!("⚠️  Extraction reply has a non-array 'rules' field");
                return Vec::new();
            }
        }
    } else {
        match parsed {
            Value::Array(items) => items,
            object @ Value::Object(_) => vec![object],
            _ => {
                eprintln!("⚠️  Extraction reply is not a JSON object or array");
                return Vec::new();
            }
        }
    };

    // Lenient per-item deserialization: missing fields default, the schema
    // validator downstream is the gate. Non-object items are dropped.
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

/// Extract a single JSON object from a raw LLM reply (used for risk
/// analysis replies). None on any parse failure or non-object shape.
pub fn sanitize_object(raw: &str) -> Option<Value> {
    let clean = strip_code_fences(raw);

    match serde_json::from_str::<Value>(&clean) {
        Ok(value @ Value::Object(_)) => Some(value),
        Ok(_) => None,
        Err(_) => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_RULES: &str = r#"{"rules": [
        {"title": "Country", "description": "Counterparty country", "category": "Hedging", "confidence": 95}
    ]}"#;

    #[test]
    fn test_sanitize_object_with_rules_field() {
        let candidates = sanitize_rules(CLEAN_RULES);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Country");
        assert_eq!(candidates[0].confidence, 95.0);
    }

    #[test]
    fn test_sanitize_bare_array() {
        let candidates = sanitize_rules(
            r#"[{"title": "A", "description": "d", "category": "c", "confidence": 50},
                {"title": "B", "description": "d", "category": "c", "confidence": 60}]"#,
        );
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].title, "B");
    }

    #[test]
    fn test_sanitize_single_object() {
        let candidates = sanitize_rules(
            r#"{"title": "Solo", "description": "d", "category": "c", "confidence": 80}"#,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Solo");
    }

    #[test]
    fn test_strips_code_fences() {
        let fenced = format!("```json\n{}\n```", CLEAN_RULES);
        let candidates = sanitize_rules(&fenced);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Country");
    }

    #[test]
    fn test_fail_soft_on_garbage() {
        // Contract: garbage returns an empty list, never an error
        assert!(sanitize_rules("not json").is_empty());
        assert!(sanitize_rules("").is_empty());
        assert!(sanitize_rules("```json\nstill not json\n```").is_empty());
        assert!(sanitize_rules("42").is_empty());
    }

    #[test]
    fn test_non_array_rules_field_is_rejected() {
        assert!(sanitize_rules(r#"{"rules": "oops"}"#).is_empty());
    }

    #[test]
    fn test_idempotent_on_clean_json() {
        let first = sanitize_rules(CLEAN_RULES);
        let reserialized = serde_json::to_string(&serde_json::json!({ "rules": first })).unwrap();
        let second = sanitize_rules(&reserialized);
        assert_eq!(first, second);
    }

    #[test]
    fn test_sanitize_object_shapes() {
        let obj = sanitize_object("```json\n{\"explanation\": \"risk\"}\n```").unwrap();
        assert_eq!(obj["explanation"], "risk");

        assert!(sanitize_object("[1, 2, 3]").is_none());
        assert!(sanitize_object("not json").is_none());
    }
}
