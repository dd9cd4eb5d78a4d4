// 📜 Rule Model - Compliance rules as data
// A Rule is born from dual-source extraction, reconciled, schema-checked,
// and only enters profiling once a human flips it to Validated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

// ============================================================================
// RULE STATUS
// ============================================================================

/// Human-approval gate. Rules start Pending and only an explicit
/// approval action flips them to Validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Pending,
    Validated,
}

impl RuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleStatus::Pending => "pending",
            RuleStatus::Validated => "validated",
        }
    }

    pub fn parse(s: &str) -> Option<RuleStatus> {
        match s {
            "pending" => Some(RuleStatus::Pending),
            "validated" => Some(RuleStatus::Validated),
            _ => None,
        }
    }
}

impl Default for RuleStatus {
    fn default() -> Self {
        RuleStatus::Pending
    }
}

// ============================================================================
// EXTRACTED RULE CANDIDATE (per-source, pre-reconciliation)
// ============================================================================

/// One rule as a single extraction source reported it.
///
/// Deserialization is deliberately lenient: a backend that omits a field
/// yields an empty/zero value here, and the schema validator - not serde -
/// is the gate that rejects it. Constraints stay as raw JSON until the
/// validator has checked their shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCandidate {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    /// Source-reported confidence, 0-100
    #[serde(default)]
    pub confidence: f64,

    /// Raw constraints object (untrusted until schema-checked)
    #[serde(default)]
    pub constraints: Option<Value>,
}

// ============================================================================
// RULE (reconciled, annotated, store-bound)
// ============================================================================

/// Authoritative compliance rule produced by reconciliation.
///
/// Identity (`id`, a UUID) is distinct from the content hash: identity is
/// stable across status changes, the hash is the deduplication key for
/// re-ingesting the same document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identity, assigned when reconciliation creates the rule
    #[serde(default)]
    pub id: String,

    pub title: String,
    pub description: String,
    pub category: String,

    /// Reconciled confidence, 0-100 (min of both sources when matched)
    pub confidence: f64,

    /// Raw constraints JSON, passed through from source A
    #[serde(default)]
    pub constraints: Option<Value>,

    #[serde(default)]
    pub status: RuleStatus,

    /// True iff the two extraction sources agreed on every compared field
    pub cross_validated: bool,

    /// Human-readable mismatch descriptions; None when the sources agreed
    #[serde(default)]
    pub discrepancies: Option<Vec<String>>,

    /// Provenance: when this rule was extracted
    #[serde(default)]
    pub extracted_at: Option<DateTime<Utc>>,
}

impl Rule {
    /// Deduplication hash over the fields that define rule content.
    /// NOTE: this is for DEDUPLICATION, not identity - identity is `id`.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.title.as_bytes());
        hasher.update(self.description.as_bytes());
        hasher.update(self.category.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Assign identity and provenance for a freshly reconciled rule
    pub fn init_identity(&mut self) {
        if self.id.is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
        if self.extracted_at.is_none() {
            self.extracted_at = Some(Utc::now());
        }
    }

    /// `constraints.allowedValues` as strings, None when absent.
    /// Only meaningful on schema-checked rules; non-string entries are
    /// skipped here because the validator already rejected them upstream.
    pub fn allowed_values(&self) -> Option<Vec<String>> {
        let list = self.constraints.as_ref()?.get("allowedValues")?.as_array()?;
        Some(
            list.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
        )
    }

    /// `constraints.format` as a string, None when absent
    pub fn format(&self) -> Option<&str> {
        self.constraints.as_ref()?.get("format")?.as_str()
    }
}

// ============================================================================
// TESTS
// ============================================================================
