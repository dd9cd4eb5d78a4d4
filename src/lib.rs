// Compliance Sentinel - Core Library
// Turns unstructured regulatory text into a trust-scored rule set via
// dual-source AI extraction, then applies the human-approved rules to
// tabular transaction data to flag compliance risk.

pub mod backend;
pub mod db;
pub mod explainer;
pub mod extraction;
pub mod pipeline;
pub mod profiler;
pub mod reconciliation;
pub mod rules;
pub mod sanitizer;
pub mod schema;

// Re-export commonly used types
pub use backend::{AiBackend, NullBackend, ReplayBackend};
pub use db::{
    get_all_rules, get_validated_rules, insert_rules, setup_database, update_rule_status,
    InsertOutcome,
};
pub use explainer::{RiskAnalysis, RiskExplainer, FALLBACK_EXPLANATION, FALLBACK_REMEDIATION};
pub use extraction::{build_extraction_prompt, DualSourceExtractor, ExtractionOutcome};
pub use pipeline::{ingest_document, profile_data, IngestReport};
pub use profiler::{
    load_rows, rows_from_reader, ComplianceProfiler, ProfilingResult, RiskStatus, TransactionRow,
};
pub use reconciliation::{reconcile, ReconciliationReport};
pub use rules::{Rule, RuleCandidate, RuleStatus};
pub use sanitizer::{sanitize_object, sanitize_rules};
pub use schema::{retain_valid, validate_rule, ValidationError, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
