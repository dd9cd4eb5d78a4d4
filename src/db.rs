// 🗄️ Rule Store - SQLite persistence for reconciled rules
// The store serializes writes; the core reads it during profiling and
// writes to it during ingestion, nothing else. Re-ingesting the same
// document is idempotent thanks to the UNIQUE content-hash column.

use crate::rules::{Rule, RuleStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            rule_uuid TEXT UNIQUE NOT NULL,
            content_hash TEXT UNIQUE NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            confidence REAL NOT NULL,
            constraints TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            cross_validated INTEGER NOT NULL DEFAULT 0,
            discrepancies TEXT,
            extracted_at TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_rules_status ON rules(status, cross_validated)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_rules_content_hash ON rules(content_hash)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// WRITES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Insert validated rules, skipping content duplicates.
/// Callers must have assigned identity (`init_identity`) beforehand.
pub fn insert_rules(conn: &Connection, rules: &[Rule]) -> Result<InsertOutcome> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for rule in rules {
        let constraints_json = rule
            .constraints
            .as_ref()
            .map(|c| serde_json::to_string(c))
            .transpose()?;
        let discrepancies_json = rule
            .discrepancies
            .as_ref()
            .map(|d| serde_json::to_string(d))
            .transpose()?;
        let extracted_at_str = rule.extracted_at.map(|dt| dt.to_rfc3339());

        let result = conn.execute(
            "INSERT INTO rules (
                rule_uuid, content_hash, title, description, category,
                confidence, constraints, status, cross_validated,
                discrepancies, extracted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                rule.id,
                rule.content_hash(),
                rule.title,
                rule.description,
                rule.category,
                rule.confidence,
                constraints_json,
                rule.status.as_str(),
                rule.cross_validated as i64,
                discrepancies_json,
                extracted_at_str,
            ],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(InsertOutcome { inserted, duplicates })
}

/// Human approval gate: flip a rule's status by identity.
/// Returns false when no rule carries that id.
pub fn update_rule_status(conn: &Connection, rule_id: &str, status: RuleStatus) -> Result<bool> {
    let affected = conn
        .execute(
            "UPDATE rules SET status = ?1 WHERE rule_uuid = ?2",
            params![status.as_str(), rule_id],
        )
        .context("Failed to update rule status")?;

    Ok(affected > 0)
}

// ============================================================================
// READS
// ============================================================================

const RULE_COLUMNS: &str = "rule_uuid, title, description, category, confidence,
                            constraints, status, cross_validated, discrepancies, extracted_at";

pub fn get_all_rules(conn: &Connection) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM rules ORDER BY id", RULE_COLUMNS))?;
    let rules = stmt
        .query_map([], map_rule_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rules)
}

/// The profiling subset: human-approved AND agreed on by both sources
pub fn get_validated_rules(conn: &Connection) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM rules
         WHERE status = 'validated' AND cross_validated = 1
         ORDER BY id",
        RULE_COLUMNS
    ))?;
    let rules = stmt
        .query_map([], map_rule_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rules)
}

/// Decode a JSON text column, surfacing corruption instead of swallowing
/// it: a rule whose constraints fail to parse must not silently become an
/// unconstrained rule that never flags anything.
fn parse_json_column<T: serde::de::DeserializeOwned>(
    column: usize,
    json: Option<String>,
) -> rusqlite::Result<Option<T>> {
    json.map(|json| {
        serde_json::from_str(&json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    })
    .transpose()
}

fn map_rule_row(row: &Row<'_>) -> rusqlite::Result<Rule> {
    let constraints_json: Option<String> = row.get(5)?;
    let status_str: String = row.get(6)?;
    let cross_validated: i64 = row.get(7)?;
    let discrepancies_json: Option<String> = row.get(8)?;
    let extracted_at_str: Option<String> = row.get(9)?;

    let constraints = parse_json_column(5, constraints_json)?;
    let discrepancies = parse_json_column(8, discrepancies_json)?;
    let extracted_at = extracted_at_str
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Rule {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        confidence: row.get(4)?,
        constraints,
        status: RuleStatus::parse(&status_str).unwrap_or_default(),
        cross_validated: cross_validated != 0,
        discrepancies,
        extracted_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================
