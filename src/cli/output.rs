//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::args::{OutputFormat, ReclaimArgs};
use crate::error::Result;
use crate::matching::MatchResult;

/// Result structure for catalog creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct InitResult {
    pub path: String,
    pub dimension: usize,
    pub text_dimension: Option<usize>,
    pub snapshot_file: String,
}

/// Result structure for ingestion.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestSummary {
    pub items_added: usize,
    pub items_skipped: usize,
    pub total_items: usize,
    pub duration_ms: u64,
}

/// Result structure for matching.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchResult>,
    pub duration_ms: u64,
}

/// Catalog statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogStats {
    pub items: usize,
    pub distinct_item_ids: usize,
    pub dimension: usize,
    pub text_dimension: Option<usize>,
    pub categories: BTreeMap<String, usize>,
    pub snapshot_bytes: u64,
    pub model_version: String,
}

/// Proximity of two coordinates.
#[derive(Debug, Serialize, Deserialize)]
pub struct GeoScoreResult {
    pub distance_km: f64,
    pub score: f64,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &ReclaimArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &ReclaimArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    match value.get("matches").and_then(Value::as_array) {
        Some(matches) => output_matches_human(matches),
        None => output_generic_human(&value, 0),
    }
    Ok(())
}

/// Output match results in human format.
fn output_matches_human(matches: &[Value]) {
    if matches.is_empty() {
        println!("No matches.");
        return;
    }

    println!("Matches:");
    println!("════════");
    for (i, m) in matches.iter().enumerate() {
        let field = |name: &str| m.get(name).map(format_value).unwrap_or_default();
        println!();
        println!(
            "{}. {} ({}, score {})",
            i + 1,
            field("item_id"),
            field("status"),
            field("final_score")
        );
        println!("─────────────");
        if let Some(breakdown) = m.get("breakdown") {
            output_generic_human(breakdown, 1);
        }
        println!("  object_class: {}", field("object_class"));
    }
}

/// Print a JSON value as indented `key: value` lines.
fn output_generic_human(value: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                if val.is_object() {
                    println!("{pad}{key}:");
                    output_generic_human(val, indent + 1);
                } else {
                    println!("{pad}{key}: {}", format_value(val));
                }
            }
        }
        _ => println!("{pad}{}", format_value(value)),
    }
}

fn output_json<T: Serialize>(result: &T, args: &ReclaimArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        Value::Object(_) => "[object]".to_string(),
        Value::Null => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("wallet")), "wallet");
        assert_eq!(format_value(&json!(0.845)), "0.845");
        assert_eq!(format_value(&json!([1, 2])), "[1, 2]");
        assert_eq!(format_value(&Value::Null), "-");
        assert_eq!(format_value(&json!({"a": 1})), "[object]");
    }
}
