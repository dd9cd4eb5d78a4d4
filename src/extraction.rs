// 🔀 Dual-Source Extractor - Same prompt, two independent backends
// Querying two models that do not share training or failure modes gives
// the reconciler something to cross-validate. A failure on one side must
// never take down the other side's result.

use crate::backend::AiBackend;
use crate::rules::RuleCandidate;
use crate::sanitizer::sanitize_rules;

/// Extraction runs at temperature 0: we want the most deterministic
/// reading of the document, not creativity.
const EXTRACTION_TEMPERATURE: f64 = 0.0;

// ============================================================================
// EXTRACTION OUTCOME
// ============================================================================

/// Per-source candidate lists, paired only after both calls complete.
/// An empty side means that backend failed or returned nothing usable.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub source_a: Vec<RuleCandidate>,
    pub source_b: Vec<RuleCandidate>,
}

// ============================================================================
// PROMPT
// ============================================================================

/// Build the rule-extraction prompt shared by both sources
pub fn build_extraction_prompt(document_text: &str) -> String {
    format!(
        "You are an expert in banking regulatory compliance, specializing in ASC 815 hedging rules. \
Extract compliance rules from the following document text, focusing on tables.\n\
\n\
Format requirements:\n\
- Return a JSON object with a \"rules\" array.\n\
- Each rule must have:\n\
  * title: \"Field Name\" from the table.\n\
  * description: \"Description\" column, summarized if needed.\n\
  * category: Infer from context (default \"Hedging\").\n\
  * confidence: Number 0-100.\n\
  * constraints: Object with \"allowedValues\" (from \"Allowable Values\") and \"format\" if applicable.\n\
\n\
Document text:\n{}",
        document_text
    )
}

// ============================================================================
// DUAL-SOURCE EXTRACTOR
// ============================================================================

pub struct DualSourceExtractor {
    source_a: Box<dyn AiBackend>,
    source_b: Box<dyn AiBackend>,
}

impl DualSourceExtractor {
    /// Backends are explicit constructor arguments; source A is the
    /// authoritative one during reconciliation.
    pub fn new(source_a: Box<dyn AiBackend>, source_b: Box<dyn AiBackend>) -> Self {
        DualSourceExtractor { source_a, source_b }
    }

    /// Send the same extraction prompt to both backends and sanitize each
    /// raw reply independently. The two calls share no state; a failed
    /// side degrades to an empty candidate list.
    pub fn extract(&self, document_text: &str) -> ExtractionOutcome {
        let prompt = build_extraction_prompt(document_text);

        ExtractionOutcome {
            source_a: self.query_source(self.source_a.as_ref(), &prompt),
            source_b: self.query_source(self.source_b.as_ref(), &prompt),
        }
    }

    fn query_source(&self, backend: &dyn AiBackend, prompt: &str) -> Vec<RuleCandidate> {
        match backend.complete(prompt, EXTRACTION_TEMPERATURE) {
            Ok(reply) => sanitize_rules(&reply),
            Err(err) => {
                // Recoverable by contract: log and treat as "no candidates"
                eprintln!("⚠️  Backend '{}' failed: {}", backend.name(), err);
                Vec::new()
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
