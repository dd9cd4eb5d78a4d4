// 📐 Rule Schema Validation
// Pure shape check between reconciliation and the store. Rules that fail
// here are dropped before persistence; callers only observe the reduced
// count. Everything coming out of the sanitizer is untrusted input.

use crate::rules::Rule;
use serde_json::Value;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

// ============================================================================
// RULE VALIDATOR
// ============================================================================

/// Schema-check a reconciled rule before it may enter the store.
///
/// Rejects empty title/description/category, confidence outside [0, 100],
/// and malformed constraints (non-object value, non-string allowedValues
/// entries, non-string format).
pub fn validate_rule(rule: &Rule) -> ValidationResult {
    let mut errors = Vec::new();

    if rule.title.is_empty() {
        errors.push(ValidationError {
            field: "title".to_string(),
            message: "Required field is empty".to_string(),
        });
    }

    if rule.description.is_empty() {
        errors.push(ValidationError {
            field: "description".to_string(),
            message: "Required field is empty".to_string(),
        });
    }

    if rule.category.is_empty() {
        errors.push(ValidationError {
            field: "category".to_string(),
            message: "Required field is empty".to_string(),
        });
    }

    if !(0.0..=100.0).contains(&rule.confidence) || rule.confidence.is_nan() {
        errors.push(ValidationError {
            field: "confidence".to_string(),
            message: format!("Must be between 0 and 100, got {}", rule.confidence),
        });
    }

    if let Some(constraints) = &rule.constraints {
        validate_constraints(constraints, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_constraints(constraints: &Value, errors: &mut Vec<ValidationError>) {
    let obj = match constraints.as_object() {
        Some(obj) => obj,
        None => {
            errors.push(ValidationError {
                field: "constraints".to_string(),
                message: "Must be an object".to_string(),
            });
            return;
        }
    };

    if let Some(allowed) = obj.get("allowedValues") {
        match allowed.as_array() {
            Some(items) => {
                if items.iter().any(|v| !v.is_string()) {
                    errors.push(ValidationError {
                        field: "constraints.allowedValues".to_string(),
                        message: "All entries must be strings".to_string(),
                    });
                }
            }
            None => {
                errors.push(ValidationError {
                    field: "constraints.allowedValues".to_string(),
                    message: "Must be an array of strings".to_string(),
                });
            }
        }
    }

    if let Some(format) = obj.get("format") {
        if !format.is_string() {
            errors.push(ValidationError {
                field: "constraints.format".to_string(),
                message: "Must be a string".to_string(),
            });
        }
    }
}

/// Partition a reconciled batch into store-eligible rules and a rejection
/// count, logging each rejection.
pub fn retain_valid(rules: Vec<Rule>) -> (Vec<Rule>, usize) {
    let mut valid = Vec::with_capacity(rules.len());
    let mut rejected = 0;

    for rule in rules {
        match validate_rule(&rule) {
            Ok(()) => valid.push(rule),
            Err(errors) => {
                rejected += 1;
                for error in &errors {
                    eprintln!("⚠️  Rejected rule '{}': {}", rule.title, error);
                }
            }
        }
    }

    (valid, rejected)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleStatus;
    use serde_json::json;

    fn rule_with(constraints: Option<Value>) -> Rule {
        Rule {
            id: String::new(),
            title: "Country".to_string(),
            description: "Counterparty country".to_string(),
            category: "Hedging".to_string(),
            confidence: 90.0,
            constraints,
            status: RuleStatus::Pending,
            cross_validated: true,
            discrepancies: None,
            extracted_at: None,
        }
    }

    #[test]
    fn test_valid_rule_passes() {
        assert!(validate_rule(&rule_with(None)).is_ok());
        assert!(validate_rule(&rule_with(Some(json!({
            "allowedValues": ["US", "UK"],
            "format": "yyyy-mm-dd"
        }))))
        .is_ok());
    }

    #[test]
    fn test_empty_required_fields_rejected() {
        let mut rule = rule_with(None);
        rule.title = String::new();
        rule.description = String::new();

        let errors = validate_rule(&rule).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "title");
        assert_eq!(errors[1].field, "description");
    }

    #[test]
    fn test_confidence_bounds() {
        let mut rule = rule_with(None);

        rule.confidence = 0.0;
        assert!(validate_rule(&rule).is_ok());
        rule.confidence = 100.0;
        assert!(validate_rule(&rule).is_ok());

        rule.confidence = 100.5;
        assert!(validate_rule(&rule).is_err());
        rule.confidence = -1.0;
        assert!(validate_rule(&rule).is_err());
        rule.confidence = f64::NAN;
        assert!(validate_rule(&rule).is_err());
    }

    #[test]
    fn test_non_string_allowed_values_rejected() {
        let rule = rule_with(Some(json!({ "allowedValues": ["US", 42] })));
        let errors = validate_rule(&rule).unwrap_err();
        assert_eq!(errors[0].field, "constraints.allowedValues");
    }

    #[test]
    fn test_non_string_format_rejected() {
        let rule = rule_with(Some(json!({ "format": 7 })));
        let errors = validate_rule(&rule).unwrap_err();
        assert_eq!(errors[0].field, "constraints.format");
    }

    #[test]
    fn test_non_object_constraints_rejected() {
        let rule = rule_with(Some(json!("yyyy-mm-dd")));
        let errors = validate_rule(&rule).unwrap_err();
        assert_eq!(errors[0].field, "constraints");
    }

    #[test]
    fn test_retain_valid_partitions_and_counts() {
        let good = rule_with(None);
        let mut bad = rule_with(None);
        bad.category = String::new();

        let (valid, rejected) = retain_valid(vec![good.clone(), bad]);

        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].title, good.title);
        assert_eq!(rejected, 1);
    }
}
