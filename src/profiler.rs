// 🔍 Compliance Profiler - Score tabular rows against validated rules
// Only rules a human approved AND both extraction sources agreed on are
// allowed to flag transactions. Each row is a pure function of (row,
// rules); rows never influence each other's results.

use crate::explainer::RiskExplainer;
use crate::rules::Rule;
use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::io::Read;
use std::path::Path;

// ============================================================================
// TRANSACTION ROW
// ============================================================================

/// One CSV row as ordered (column, value) pairs. The schema is whatever
/// the CSV header says; there is no fixed shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    cells: Vec<(String, String)>,
}

impl TransactionRow {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        TransactionRow { cells }
    }

    /// Cell value for a column, None when the column is absent
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// JSON object rendering (for prompts and result output)
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.cells
                .iter()
                .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
                .collect(),
        )
    }
}

// Serialize as a JSON object in column order
impl Serialize for TransactionRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ============================================================================
// CSV ROW SOURCE
// ============================================================================

/// Read header-driven rows from a CSV file, in file order
pub fn load_rows(csv_path: &Path) -> Result<Vec<TransactionRow>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file {:?}", csv_path))?;

    rows_from_reader(reader)
}

pub fn rows_from_reader<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<TransactionRow>> {
    let headers = reader.headers().context("Failed to read CSV header")?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read CSV record")?;
        let cells = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        rows.push(TransactionRow::new(cells));
    }

    Ok(rows)
}

// ============================================================================
// PROFILING RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskStatus {
    #[serde(rename = "compliant")]
    Compliant,
    #[serde(rename = "medium-risk")]
    MediumRisk,
    #[serde(rename = "high-risk")]
    HighRisk,
}

impl RiskStatus {
    /// Deterministic function of the issue count: 0 compliant, exactly 1
    /// medium, 2 or more high. Thresholds are exact.
    pub fn from_issue_count(count: usize) -> RiskStatus {
        match count {
            0 => RiskStatus::Compliant,
            1 => RiskStatus::MediumRisk,
            _ => RiskStatus::HighRisk,
        }
    }
}

/// Per-row outcome. Immutable once created; persistence is the caller's
/// concern, not the profiler's.
#[derive(Debug, Clone, Serialize)]
pub struct ProfilingResult {
    pub row: TransactionRow,
    pub issues: Vec<String>,
    pub risk_score: f64,
    pub status: RiskStatus,
    pub explanation: String,
    pub remediation: Vec<String>,
}

// ============================================================================
// COMPLIANCE PROFILER
// ============================================================================

pub struct ComplianceProfiler<'a> {
    /// The validated + cross-validated rule subset (caller pre-filters
    /// via the store query)
    rules: &'a [Rule],
    explainer: &'a RiskExplainer,
}

impl<'a> ComplianceProfiler<'a> {
    pub fn new(rules: &'a [Rule], explainer: &'a RiskExplainer) -> Self {
        ComplianceProfiler { rules, explainer }
    }

    /// Evaluate one row against every rule and compute its risk.
    ///
    /// risk_score = issues / rule count, with an explicit zero-rule guard:
    /// no rules means every row is trivially compliant at score 0.
    pub fn profile_row(&self, row: &TransactionRow) -> ProfilingResult {
        let issues = self.evaluate(row);

        let risk_score = if self.rules.is_empty() {
            0.0
        } else {
            issues.len() as f64 / self.rules.len() as f64
        };
        let status = RiskStatus::from_issue_count(issues.len());

        let (explanation, remediation) = if issues.is_empty() {
            (String::new(), Vec::new())
        } else {
            let analysis = self.explainer.explain(row, &issues, self.rules);
            (analysis.explanation, analysis.remediation)
        };

        ProfilingResult {
            row: row.clone(),
            issues,
            risk_score,
            status,
            explanation,
            remediation,
        }
    }

    /// Profile rows sequentially, in input order. Each flagged row's
    /// explanation completes before the next row begins (deliberate
    /// backpressure against external API rate limits).
    pub fn profile_batch(&self, rows: &[TransactionRow]) -> Vec<ProfilingResult> {
        rows.iter().map(|row| self.profile_row(row)).collect()
    }

    fn evaluate(&self, row: &TransactionRow) -> Vec<String> {
        let mut issues = Vec::new();

        for rule in self.rules {
            let value = match row.get(&rule.title) {
                Some(v) if !v.is_empty() => v,
                // Absent or empty cell: no issue, whatever the constraints
                _ => continue,
            };

            if let Some(allowed) = rule.allowed_values() {
                if !allowed.iter().any(|a| a == value) {
                    // Bare-comma join of the allowed list, e.g. "US,UK"
                    issues.push(format!(
                        "{}: Value '{}' not in {}",
                        rule.title,
                        value,
                        allowed.join(",")
                    ));
                }
            }

            if rule.format() == Some("yyyy-mm-dd") && !is_strict_iso_date(value) {
                issues.push(format!("{}: Invalid date format", rule.title));
            }
        }

        issues
    }
}

/// Strict 4-2-2 digit pattern with dash separators, nothing else
fn is_strict_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

// ============================================================================
// TESTS
// ============================================================================
