#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::info;

use crate::models::{IntegrityReport, ValidationReport};
use crate::queries::aggregate::{GroupStats, round1, round2};
use crate::queries::{FOCUS_CORRIDOR, QueryError, column};
use crate::store::{TabularStore, Table, Value};

const RULE_HEAVY: &str = "============================================================";
const RULE_WIDE: &str = "--------------------------------------------------------------------------------";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Console rendering of one validation report.
pub fn render_validation_report(report: &ValidationReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("\n{RULE_HEAVY}\n"));
    out.push_str(&format!("DATA VALIDATION REPORT: {}\n", report.table));
    out.push_str(&format!("{RULE_HEAVY}\n"));
    out.push_str(&format!("File: {}\n", report.file.display()));
    out.push_str(&format!("Records Loaded: {}\n", report.records_loaded));
    out.push_str(&format!("Columns: {}\n", report.columns.len()));
    out.push_str(&format!("Column Names: {}\n", report.columns.join(", ")));

    if report.null_counts.is_empty() {
        out.push_str("No null values found\n");
    } else {
        out.push_str("NULL VALUES DETECTED:\n");

        for (column, count) in &report.null_counts {
            out.push_str(&format!("  - {column}: {count} nulls\n"));
        }
    }

    if report.duplicates > 0 {
        out.push_str(&format!("DUPLICATES: {} repeated keys\n", report.duplicates));
    } else {
        out.push_str("No duplicate keys\n");
    }

    if let Some((min, max)) = report.date_range {
        out.push_str(&format!("Date Range: {min} to {max}\n"));
    }

    out.push_str(&format!("Status: {}\n", report.status));
    out.push_str(&format!("{RULE_HEAVY}\n"));

    out
}

/// Writes the fixed-layout validation summary file covering every load plus
/// the referential integrity result.
pub fn write_validation_summary(
    reports: &[ValidationReport],
    integrity: &IntegrityReport,
    path: &Path,
) -> Result<(), ReportError> {
    let mut out = String::new();

    out.push_str("PAYMENT CORRIDOR ANALYSIS - DATA VALIDATION SUMMARY\n");
    out.push_str(&format!("{RULE_WIDE}\n\n"));

    for report in reports {
        out.push_str(&format!("Table: {}\n", report.table));
        out.push_str(&format!("File: {}\n", report.file.display()));
        out.push_str(&format!("Records: {}\n", report.records_loaded));
        out.push_str(&format!("Columns: {}\n", report.columns.len()));
        out.push_str(&format!("Null Values: {}\n", report.total_nulls()));
        out.push_str(&format!("Duplicates: {}\n", report.duplicates));

        if let Some((min, max)) = report.date_range {
            out.push_str(&format!("Date Range: {min} to {max}\n"));
        }

        out.push_str(&format!("Status: {}\n", report.status));
        out.push_str(&format!("{RULE_WIDE}\n\n"));
    }

    let plural = if integrity.orphaned_transactions == 1 { "" } else { "s" };

    out.push_str(&format!(
        "Referential Integrity: {} ({} orphaned transaction{plural})\n\n",
        integrity.status, integrity.orphaned_transactions
    ));
    out.push_str("Validation Complete\n");

    write_text(path, &out)
}

/// Exports one result table as a CSV file with a header row.
pub fn write_table_csv(table: &Table, path: &Path) -> Result<(), ReportError> {
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(table.columns())?;

    for row in table.rows() {
        writer.write_record(row.iter().map(|value| value.to_string()))?;
    }

    writer.flush()?;

    Ok(())
}

#[derive(Serialize)]
struct DataQuality<'a> {
    loads: &'a [ValidationReport],
    integrity: &'a IntegrityReport,
}

#[derive(Serialize)]
struct WebDataBundle<'a> {
    data_quality: DataQuality<'a>,
    headline: &'a HeadlineMetrics,
    queries: BTreeMap<&'a str, JsonValue>,
}

/// Writes the JSON feed consumed by the dashboard: data quality, headline
/// figures and every catalog result as record arrays.
pub fn write_summary_json(
    results: &[(&str, Table)],
    reports: &[ValidationReport],
    integrity: &IntegrityReport,
    headline: &HeadlineMetrics,
    path: &Path,
) -> Result<(), ReportError> {
    let bundle = WebDataBundle {
        data_quality: DataQuality {
            loads: reports,
            integrity,
        },
        headline,
        queries: results.iter().map(|(name, table)| (*name, table_records(table))).collect(),
    };

    ensure_parent(path)?;
    fs::write(path, serde_json::to_string_pretty(&bundle)?)?;
    info!("JSON summary written to [{}]", path.display());

    Ok(())
}

fn table_records(table: &Table) -> JsonValue {
    let records = table
        .rows()
        .iter()
        .map(|row| {
            let record = table
                .columns()
                .iter()
                .zip(row)
                .map(|(column, value)| (column.clone(), json_value(value)))
                .collect();

            JsonValue::Object(record)
        })
        .collect();

    JsonValue::Array(records)
}

fn json_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Text(text) => JsonValue::String(text.clone()),
        Value::Number(number) => number
            .to_f64()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(number.to_string())),
    }
}

/// The figures quoted in the executive summary.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlineMetrics {
    pub total_transactions: u64,
    pub overall_failure_rate: Decimal,
    pub total_value: Decimal,
    pub focus_corridor: String,
    pub focus_transactions: u64,
    pub focus_share_pct: Decimal,
    pub focus_failure_rate: Decimal,
    pub focus_avg_amount: Option<Decimal>,
}

/// Computes the headline figures in one pass over `transactions`.
/// Rates are rounded to one decimal place, the precision they are quoted at.
pub fn headline_metrics(store: &TabularStore) -> Result<HeadlineMetrics, QueryError> {
    let transactions = store.table("transactions")?;
    let corridor = column(transactions, "transactions", "corridor")?;
    let status = column(transactions, "transactions", "status")?;
    let amount = column(transactions, "transactions", "amount_usd")?;

    let mut overall = GroupStats::default();
    let mut focus = GroupStats::default();

    for row in transactions.rows() {
        overall.record(row[status].as_text(), row[amount].as_number(), None);

        if row[corridor].as_text() == Some(FOCUS_CORRIDOR) {
            focus.record(row[status].as_text(), row[amount].as_number(), None);
        }
    }

    let share = if overall.count == 0 {
        Decimal::ZERO
    } else {
        round1(Decimal::from(focus.count) * Decimal::ONE_HUNDRED / Decimal::from(overall.count))
    };

    Ok(HeadlineMetrics {
        total_transactions: overall.count,
        overall_failure_rate: round1(overall.failure_rate()),
        total_value: round2(overall.total_value()),
        focus_corridor: FOCUS_CORRIDOR.to_string(),
        focus_transactions: focus.count,
        focus_share_pct: share,
        focus_failure_rate: round1(focus.failure_rate()),
        focus_avg_amount: focus.avg_amount().as_number(),
    })
}

/// Console rendering of the headline figures.
pub fn render_headline_metrics(metrics: &HeadlineMetrics) -> String {
    let mut out = String::new();

    out.push_str(&format!("\n{RULE_HEAVY}\n"));
    out.push_str("HEADLINE METRICS\n");
    out.push_str(&format!("{RULE_HEAVY}\n"));
    out.push_str(&format!("Total Transactions: {}\n", metrics.total_transactions));
    out.push_str(&format!("Total Value (USD): {}\n", metrics.total_value));
    out.push_str(&format!("Overall Failure Rate: {}%\n", metrics.overall_failure_rate));
    out.push_str(&format!(
        "{} Volume: {} transactions ({}% of total)\n",
        metrics.focus_corridor, metrics.focus_transactions, metrics.focus_share_pct
    ));
    out.push_str(&format!(
        "{} Failure Rate: {}%\n",
        metrics.focus_corridor, metrics.focus_failure_rate
    ));

    if let Some(avg_amount) = metrics.focus_avg_amount {
        out.push_str(&format!("{} Avg Amount: {}\n", metrics.focus_corridor, avg_amount));
    }

    out.push_str(&format!("{RULE_HEAVY}\n"));

    out
}

fn ensure_parent(path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(())
}

fn write_text(path: &Path, contents: &str) -> Result<(), ReportError> {
    ensure_parent(path)?;
    fs::write(path, contents)?;
    info!("Report written to [{}]", path.display());

    Ok(())
}
