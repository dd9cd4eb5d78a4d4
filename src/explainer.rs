// 💬 Risk Explainer - Natural-language risk analysis for flagged rows
// One backend call per flagged row. Every failure mode collapses into one
// deterministic fallback object; the fallback wording is a contract that
// callers and tests rely on verbatim.

use crate::backend::AiBackend;
use crate::profiler::TransactionRow;
use crate::rules::Rule;
use crate::sanitizer::sanitize_object;
use serde::{Deserialize, Serialize};

/// Slightly above zero: precise, but allowed to phrase remediation steps
const ANALYSIS_TEMPERATURE: f64 = 0.2;

pub const FALLBACK_EXPLANATION: &str = "Unable to analyze due to processing error.";
pub const FALLBACK_REMEDIATION: &str = "Contact support for manual review.";

// ============================================================================
// RISK ANALYSIS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    #[serde(default)]
    pub explanation: String,

    #[serde(default)]
    pub remediation: Vec<String>,
}

impl RiskAnalysis {
    /// The deterministic substitute used when the backend call fails or
    /// returns unusable content
    pub fn fallback() -> Self {
        RiskAnalysis {
            explanation: FALLBACK_EXPLANATION.to_string(),
            remediation: vec![FALLBACK_REMEDIATION.to_string()],
        }
    }
}

// ============================================================================
// RISK EXPLAINER
// ============================================================================

pub struct RiskExplainer {
    backend: Box<dyn AiBackend>,
}

impl RiskExplainer {
    pub fn new(backend: Box<dyn AiBackend>) -> Self {
        RiskExplainer { backend }
    }

    /// Request an explanation and remediation steps for a flagged row.
    /// Only rules whose title appears in one of the issue strings are
    /// included in the prompt context.
    pub fn explain(&self, row: &TransactionRow, issues: &[String], rules: &[Rule]) -> RiskAnalysis {
        let relevant: Vec<&Rule> = rules
            .iter()
            .filter(|rule| issues.iter().any(|issue| issue.contains(&rule.title)))
            .collect();

        let prompt = build_analysis_prompt(row, issues, &relevant);

        let reply = match self.backend.complete(&prompt, ANALYSIS_TEMPERATURE) {
            Ok(reply) => reply,
            Err(err) => {
                eprintln!("⚠️  Backend '{}' failed: {}", self.backend.name(), err);
                return RiskAnalysis::fallback();
            }
        };

        match sanitize_object(&reply).and_then(|obj| serde_json::from_value(obj).ok()) {
            Some(analysis) => analysis,
            None => {
                eprintln!("⚠️  Unusable analysis reply from '{}'", self.backend.name());
                RiskAnalysis::fallback()
            }
        }
    }
}

fn build_analysis_prompt(row: &TransactionRow, issues: &[String], rules: &[&Rule]) -> String {
    // Prompt context is best effort; serialization of these types cannot fail
    let row_json = row.to_json().to_string();
    let issues_json = serde_json::to_string(issues).unwrap_or_default();
    let rules_json = serde_json::to_string(rules).unwrap_or_default();

    format!(
        "You are an expert in banking regulatory compliance, specializing in ASC 815 hedging rules.\n\
Given the following customer data and identified issues, provide:\n\
1. A detailed explanation of the risks.\n\
2. Specific remediation steps to resolve the issues.\n\
\n\
Customer Data: {}\n\
Issues: {}\n\
Relevant Rules: {}\n\
\n\
Return a JSON object with:\n\
- explanation: String describing the risks\n\
- remediation: Array of specific steps to fix the issues",
        row_json, issues_json, rules_json
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NullBackend, ReplayBackend};
    use crate::rules::RuleStatus;

    fn rule(title: &str) -> Rule {
        Rule {
            id: String::new(),
            title: title.to_string(),
            description: format!("{} description", title),
            category: "Hedging".to_string(),
            confidence: 90.0,
            constraints: None,
            status: RuleStatus::Validated,
            cross_validated: true,
            discrepancies: None,
            extracted_at: None,
        }
    }

    fn sample_row() -> TransactionRow {
        TransactionRow::new(vec![("Country".to_string(), "FR".to_string())])
    }

    #[test]
    fn test_successful_analysis() {
        let reply = r#"```json
{"explanation": "FR is outside the approved jurisdictions.", "remediation": ["Move the trade to an approved jurisdiction."]}
```"#;
        let explainer = RiskExplainer::new(Box::new(ReplayBackend::new("analysis", reply)));

        let analysis = explainer.explain(
            &sample_row(),
            &["Country: Value 'FR' not in US,UK".to_string()],
            &[rule("Country")],
        );

        assert_eq!(analysis.explanation, "FR is outside the approved jurisdictions.");
        assert_eq!(analysis.remediation.len(), 1);
    }

    #[test]
    fn test_backend_failure_returns_exact_fallback() {
        let explainer = RiskExplainer::new(Box::new(NullBackend));

        let analysis = explainer.explain(
            &sample_row(),
            &["Country: Value 'FR' not in US,UK".to_string()],
            &[rule("Country")],
        );

        // Verbatim contract
        assert_eq!(analysis.explanation, "Unable to analyze due to processing error.");
        assert_eq!(
            analysis.remediation,
            vec!["Contact support for manual review.".to_string()]
        );
        assert_eq!(analysis, RiskAnalysis::fallback());
    }

    #[test]
    fn test_malformed_reply_returns_fallback() {
        let explainer =
            RiskExplainer::new(Box::new(ReplayBackend::new("analysis", "I think the risk is high")));

        let analysis = explainer.explain(
            &sample_row(),
            &["Country: Value 'FR' not in US,UK".to_string()],
            &[rule("Country")],
        );

        assert_eq!(analysis, RiskAnalysis::fallback());
    }

    #[test]
    fn test_array_reply_returns_fallback() {
        let explainer =
            RiskExplainer::new(Box::new(ReplayBackend::new("analysis", "[\"not\", \"an\", \"object\"]")));

        let analysis = explainer.explain(
            &sample_row(),
            &["Country: Value 'FR' not in US,UK".to_string()],
            &[rule("Country")],
        );

        assert_eq!(analysis, RiskAnalysis::fallback());
    }

    #[test]
    fn test_prompt_includes_only_relevant_rules() {
        let issues = vec!["Country: Value 'FR' not in US,UK".to_string()];
        let rules = [rule("Country"), rule("Notional Amount")];

        let filtered: Vec<&Rule> = rules
            .iter()
            .filter(|r| issues.iter().any(|i| i.contains(&r.title)))
            .collect();
        let prompt = build_analysis_prompt(&sample_row(), &issues, &filtered);

        assert!(prompt.contains("Country"));
        assert!(!prompt.contains("Notional Amount"));
        assert!(prompt.contains("\"Country\":\"FR\""));
    }
}
