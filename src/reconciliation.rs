// ⚖️ Rule Reconciler - Cross-validate two independently extracted rule sets
// Source A is authoritative for enumeration: every emitted rule starts
// from a source-A candidate, annotated with whether source B agreed.

use crate::rules::{Rule, RuleCandidate, RuleStatus};

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReconciliationReport {
    /// Reconciled rules, all Pending, in source-A order
    pub rules: Vec<Rule>,

    /// How many emitted rules had full agreement from source B
    pub cross_validated_count: usize,

    /// Source-B candidates with no source-A counterpart. Dropped by
    /// policy (source A enumerates); surfaced here so callers can log it.
    pub source_b_only_count: usize,
}

// ============================================================================
// RECONCILER
// ============================================================================

/// Cross-validate the two candidate sets into one annotated rule set.
///
/// For each source-A candidate, the first source-B candidate with an
/// exactly equal title (case-sensitive) is its counterpart. Matched pairs
/// are compared on description and category; each mismatch records one
/// discrepancy entry and the reconciled confidence is the minimum of the
/// two sources. Unmatched candidates are emitted with a "No match in
/// source B" discrepancy and their confidence unchanged.
pub fn reconcile(source_a: &[RuleCandidate], source_b: &[RuleCandidate]) -> ReconciliationReport {
    let mut rules = Vec::with_capacity(source_a.len());
    let mut cross_validated_count = 0;

    for candidate in source_a {
        // First match wins when source B holds duplicate titles
        let counterpart = source_b.iter().find(|b| b.title == candidate.title);

        let rule = match counterpart {
            Some(b_side) => {
                let mut discrepancies = Vec::new();

                if candidate.description != b_side.description {
                    discrepancies.push(format!(
                        "Description mismatch: A=\"{}\", B=\"{}\"",
                        candidate.description, b_side.description
                    ));
                }
                if candidate.category != b_side.category {
                    discrepancies.push(format!(
                        "Category mismatch: A=\"{}\", B=\"{}\"",
                        candidate.category, b_side.category
                    ));
                }

                let cross_validated = discrepancies.is_empty();
                if cross_validated {
                    cross_validated_count += 1;
                }

                Rule {
                    id: String::new(),
                    title: candidate.title.clone(),
                    description: candidate.description.clone(),
                    category: candidate.category.clone(),
                    confidence: candidate.confidence.min(b_side.confidence),
                    constraints: candidate.constraints.clone(),
                    status: RuleStatus::Pending,
                    cross_validated,
                    discrepancies: if cross_validated {
                        None
                    } else {
                        Some(discrepancies)
                    },
                    extracted_at: None,
                }
            }
            None => Rule {
                id: String::new(),
                title: candidate.title.clone(),
                description: candidate.description.clone(),
                category: candidate.category.clone(),
                confidence: candidate.confidence,
                constraints: candidate.constraints.clone(),
                status: RuleStatus::Pending,
                cross_validated: false,
                discrepancies: Some(vec!["No match in source B".to_string()]),
                extracted_at: None,
            },
        };

        rules.push(rule);
    }

    let source_b_only_count = source_b
        .iter()
        .filter(|b| !source_a.iter().any(|a| a.title == b.title))
        .count();

    ReconciliationReport {
        rules,
        cross_validated_count,
        source_b_only_count,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(title: &str, description: &str, category: &str, confidence: f64) -> RuleCandidate {
        RuleCandidate {
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            confidence,
            constraints: None,
        }
    }

    #[test]
    fn test_full_agreement_cross_validates() {
        let a = vec![candidate("Country", "Counterparty country", "Hedging", 95.0)];
        let b = vec![candidate("Country", "Counterparty country", "Hedging", 88.0)];

        let report = reconcile(&a, &b);

        assert_eq!(report.rules.len(), 1);
        assert_eq!(report.cross_validated_count, 1);

        let rule = &report.rules[0];
        assert!(rule.cross_validated);
        assert_eq!(rule.discrepancies, None);
        assert_eq!(rule.confidence, 88.0);
        assert_eq!(rule.status, RuleStatus::Pending);
    }

    #[test]
    fn test_description_mismatch_yields_one_discrepancy() {
        let a = vec![candidate("Max Exposure", "A", "Hedging", 90.0)];
        let b = vec![candidate("Max Exposure", "B", "Hedging", 70.0)];

        let report = reconcile(&a, &b);
        let rule = &report.rules[0];

        assert!(!rule.cross_validated);
        assert_eq!(rule.confidence, 70.0);
        assert_eq!(
            rule.discrepancies,
            Some(vec!["Description mismatch: A=\"A\", B=\"B\"".to_string()])
        );
    }

    #[test]
    fn test_both_fields_mismatch_yields_two_discrepancies() {
        let a = vec![candidate("Limit", "Desc A", "Hedging", 80.0)];
        let b = vec![candidate("Limit", "Desc B", "Derivatives", 85.0)];

        let report = reconcile(&a, &b);
        let discrepancies = report.rules[0].discrepancies.as_ref().unwrap();

        assert_eq!(discrepancies.len(), 2);
        assert_eq!(discrepancies[0], "Description mismatch: A=\"Desc A\", B=\"Desc B\"");
        assert_eq!(discrepancies[1], "Category mismatch: A=\"Hedging\", B=\"Derivatives\"");
    }

    #[test]
    fn test_unmatched_source_a_candidate() {
        let a = vec![candidate("Orphan", "Desc", "Hedging", 75.0)];
        let b = vec![candidate("Other", "Desc", "Hedging", 99.0)];

        let report = reconcile(&a, &b);
        let rule = &report.rules[0];

        assert!(!rule.cross_validated);
        assert_eq!(rule.confidence, 75.0); // unchanged, no counterpart to min against
        assert_eq!(
            rule.discrepancies,
            Some(vec!["No match in source B".to_string()])
        );
        assert_eq!(report.source_b_only_count, 1);
    }

    #[test]
    fn test_title_match_is_case_sensitive() {
        let a = vec![candidate("Country", "Desc", "Hedging", 75.0)];
        let b = vec![candidate("country", "Desc", "Hedging", 99.0)];

        let report = reconcile(&a, &b);
        assert_eq!(
            report.rules[0].discrepancies,
            Some(vec!["No match in source B".to_string()])
        );
    }

    #[test]
    fn test_first_match_wins_on_duplicate_titles() {
        let a = vec![candidate("Country", "Desc", "Hedging", 90.0)];
        let b = vec![
            candidate("Country", "Desc", "Hedging", 60.0),
            candidate("Country", "Different", "Hedging", 99.0),
        ];

        let report = reconcile(&a, &b);
        let rule = &report.rules[0];

        // The first B candidate (agreeing, confidence 60) is the counterpart
        assert!(rule.cross_validated);
        assert_eq!(rule.confidence, 60.0);
    }

    #[test]
    fn test_source_a_is_authoritative_for_enumeration() {
        let a = vec![candidate("Kept", "Desc", "Hedging", 90.0)];
        let b = vec![
            candidate("Kept", "Desc", "Hedging", 80.0),
            candidate("Dropped", "Desc", "Hedging", 95.0),
        ];

        let report = reconcile(&a, &b);

        assert_eq!(report.rules.len(), 1);
        assert_eq!(report.rules[0].title, "Kept");
        assert_eq!(report.source_b_only_count, 1);
    }

    #[test]
    fn test_constraints_come_from_source_a() {
        let mut a_side = candidate("Country", "Desc", "Hedging", 90.0);
        a_side.constraints = Some(json!({ "allowedValues": ["US", "UK"] }));
        let mut b_side = candidate("Country", "Desc", "Hedging", 85.0);
        b_side.constraints = Some(json!({ "allowedValues": ["US"] }));

        let report = reconcile(&[a_side.clone()], &[b_side]);
        assert_eq!(report.rules[0].constraints, a_side.constraints);
    }

    #[test]
    fn test_empty_source_b_marks_everything_unmatched() {
        let a = vec![
            candidate("One", "Desc", "Hedging", 90.0),
            candidate("Two", "Desc", "Hedging", 80.0),
        ];

        let report = reconcile(&a, &[]);

        assert_eq!(report.rules.len(), 2);
        assert_eq!(report.cross_validated_count, 0);
        assert!(report.rules.iter().all(|r| !r.cross_validated));
    }
}
