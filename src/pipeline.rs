// 🔗 Pipeline - Wire extraction, reconciliation, validation and profiling
// Two request-shaped flows: document ingestion (write path into the rule
// store) and data profiling (read path over the approved subset). AI
// failures degrade inside the components; only infrastructure failures
// (empty input, store errors) abort a flow.

use crate::db;
use crate::explainer::RiskExplainer;
use crate::extraction::DualSourceExtractor;
use crate::profiler::{ComplianceProfiler, ProfilingResult, TransactionRow};
use crate::reconciliation::reconcile;
use crate::schema::retain_valid;
use anyhow::{bail, Result};
use rusqlite::Connection;

// ============================================================================
// INGEST REPORT
// ============================================================================

/// Per-stage counts for one document ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub source_a_candidates: usize,
    pub source_b_candidates: usize,
    pub reconciled: usize,
    pub cross_validated: usize,
    pub rejected: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

// ============================================================================
// DOCUMENT INGESTION (write path)
// ============================================================================

/// Extract rules from already-extracted document text, reconcile the two
/// sources, schema-check, and persist. Fails only on empty input or a
/// store error; AI-side problems show up as reduced counts.
pub fn ingest_document(
    extractor: &DualSourceExtractor,
    conn: &Connection,
    document_text: &str,
) -> Result<IngestReport> {
    if document_text.trim().is_empty() {
        bail!("No text extracted from document");
    }

    let outcome = extractor.extract(document_text);
    let source_a_candidates = outcome.source_a.len();
    let source_b_candidates = outcome.source_b.len();

    let report = reconcile(&outcome.source_a, &outcome.source_b);
    if report.source_b_only_count > 0 {
        // Policy: source A enumerates; B-only candidates are dropped
        eprintln!(
            "⚠️  Dropped {} source-B-only candidate(s) without a source-A counterpart",
            report.source_b_only_count
        );
    }

    let reconciled = report.rules.len();
    let cross_validated = report.cross_validated_count;

    let (mut valid, rejected) = retain_valid(report.rules);
    for rule in &mut valid {
        rule.init_identity();
    }

    let insert = db::insert_rules(conn, &valid)?;

    Ok(IngestReport {
        source_a_candidates,
        source_b_candidates,
        reconciled,
        cross_validated,
        rejected,
        inserted: insert.inserted,
        duplicates: insert.duplicates,
    })
}

// ============================================================================
// DATA PROFILING (read path)
// ============================================================================

/// Profile rows against the approved + cross-validated rule subset,
/// sequentially and in input order. The batch is atomic: a store error
/// aborts the whole call with no partial results.
pub fn profile_data(
    conn: &Connection,
    rows: &[TransactionRow],
    explainer: &RiskExplainer,
) -> Result<Vec<ProfilingResult>> {
    let rules = db::get_validated_rules(conn)?;
    let profiler = ComplianceProfiler::new(&rules, explainer);
    Ok(profiler.profile_batch(rows))
}

// ============================================================================
// TESTS
// ============================================================================
