use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use compliance_sentinel::{
    get_all_rules, ingest_document, load_rows, profile_data, setup_database, update_rule_status,
    DualSourceExtractor, NullBackend, ReplayBackend, RiskExplainer, RuleStatus,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("extract") => run_extract(&args[2..]),
        Some("rules") => run_rules(),
        Some("approve") => run_approve(&args[2..]),
        Some("profile") => run_profile(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("compliance-sentinel {}", compliance_sentinel::VERSION);
    println!();
    println!("Usage:");
    println!("  compliance-sentinel extract <document.txt> <reply-a> <reply-b>");
    println!("      Ingest rules from document text using captured backend replies");
    println!("  compliance-sentinel rules");
    println!("      List all stored rules");
    println!("  compliance-sentinel approve <rule-id>");
    println!("      Mark a rule as validated (human approval gate)");
    println!("  compliance-sentinel profile <data.csv> [analysis-reply]");
    println!("      Profile CSV rows against validated, cross-validated rules");
    println!();
    println!("Database path comes from COMPLIANCE_DB (default: compliance.db)");
}

fn db_path() -> PathBuf {
    env::var("COMPLIANCE_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("compliance.db"))
}

fn open_database() -> Result<Connection> {
    let path = db_path();
    let conn = Connection::open(&path)
        .with_context(|| format!("Failed to open database {:?}", path))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn run_extract(args: &[String]) -> Result<()> {
    let [document, reply_a, reply_b] = args else {
        bail!("Usage: compliance-sentinel extract <document.txt> <reply-a> <reply-b>");
    };

    println!("📄 Ingesting document: {}", document);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let document_text = fs::read_to_string(Path::new(document))
        .with_context(|| format!("Failed to read document {:?}", document))?;

    let extractor = DualSourceExtractor::new(
        Box::new(ReplayBackend::from_file("source-a", reply_a)?),
        Box::new(ReplayBackend::from_file("source-b", reply_b)?),
    );

    let conn = open_database()?;
    let report = ingest_document(&extractor, &conn, &document_text)?;

    println!("✓ Source A candidates: {}", report.source_a_candidates);
    println!("✓ Source B candidates: {}", report.source_b_candidates);
    println!("✓ Reconciled rules:    {}", report.reconciled);
    println!("✓ Cross-validated:     {}", report.cross_validated);
    if report.rejected > 0 {
        println!("✗ Rejected (schema):   {}", report.rejected);
    }
    println!("✓ Stored: {} new, {} duplicate(s)", report.inserted, report.duplicates);
    println!();
    println!("Next: review with 'rules', approve with 'approve <rule-id>'");

    Ok(())
}

fn run_rules() -> Result<()> {
    let conn = open_database()?;
    let rules = get_all_rules(&conn)?;

    if rules.is_empty() {
        println!("No rules stored. Run 'extract' first.");
        return Ok(());
    }

    println!("📋 {} rule(s) in store", rules.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for rule in &rules {
        let badge = if rule.cross_validated { "✓" } else { "✗" };
        println!(
            "[{}] {} ({}) confidence={:.0} status={} cross-validated={}",
            rule.id,
            rule.title,
            rule.category,
            rule.confidence,
            rule.status.as_str(),
            badge
        );
        if let Some(discrepancies) = &rule.discrepancies {
            for d in discrepancies {
                println!("      ⚠ {}", d);
            }
        }
    }

    Ok(())
}

fn run_approve(args: &[String]) -> Result<()> {
    let [rule_id] = args else {
        bail!("Usage: compliance-sentinel approve <rule-id>");
    };

    let conn = open_database()?;
    if update_rule_status(&conn, rule_id, RuleStatus::Validated)? {
        println!("✓ Rule {} marked as validated", rule_id);
    } else {
        bail!("No rule with id {}", rule_id);
    }

    Ok(())
}

fn run_profile(args: &[String]) -> Result<()> {
    let (csv_file, analysis_reply) = match args {
        [csv_file] => (csv_file, None),
        [csv_file, reply] => (csv_file, Some(reply)),
        _ => bail!("Usage: compliance-sentinel profile <data.csv> [analysis-reply]"),
    };

    println!("🔍 Profiling: {}", csv_file);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let rows = load_rows(Path::new(csv_file))?;
    println!("✓ Loaded {} row(s)", rows.len());

    // Without a captured analysis reply, flagged rows get the
    // deterministic fallback explanation
    let explainer = match analysis_reply {
        Some(reply) => RiskExplainer::new(Box::new(ReplayBackend::from_file("analysis", reply)?)),
        None => RiskExplainer::new(Box::new(NullBackend)),
    };

    let conn = open_database()?;
    let results = profile_data(&conn, &rows, &explainer)?;

    let flagged = results.iter().filter(|r| !r.issues.is_empty()).count();
    println!("✓ Profiled {} row(s), {} flagged", results.len(), flagged);
    println!();
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}
