use super::{
    headline_metrics, render_headline_metrics, render_validation_report, write_summary_json, write_table_csv,
    write_validation_summary,
};

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::tempdir;

use crate::models::{IntegrityReport, ValidationReport};
use crate::store::{TabularStore, Table, Value};

fn sample_report() -> ValidationReport {
    let mut null_counts = BTreeMap::new();
    null_counts.insert("amount_usd".to_string(), 2);

    ValidationReport {
        file: PathBuf::from("data/raw/transactions.csv"),
        table: "transactions".to_string(),
        records_loaded: 10,
        columns: vec!["transaction_id".to_string(), "amount_usd".to_string()],
        null_counts: null_counts.clone(),
        duplicates: 1,
        date_range: Some((
            NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid date"),
            NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid date"),
        )),
        status: ValidationReport::derive_status(&null_counts, 1),
    }
}

fn sample_result_table() -> Table {
    let mut table = Table::with_columns(&["corridor", "txn_count", "failure_rate"]);
    table.push_row(vec![
        Value::from("USD_MXN"),
        Value::from(2u64),
        Value::Number(Decimal::from(50)),
    ]);

    table
}

fn store_with_transactions() -> TabularStore {
    let mut table = Table::with_columns(&["transaction_id", "corridor", "amount_usd", "status"]);

    for (id, corridor, amount, status) in [
        ("T1", "USD_MXN", "12000", "failed"),
        ("T2", "USD_MXN", "500", "success"),
        ("T3", "USD_COP", "1500", "success"),
        ("T4", "USD_COP", "2500", "success"),
    ] {
        table.push_row(vec![
            Value::from(id),
            Value::from(corridor),
            Value::parse(amount),
            Value::from(status),
        ]);
    }

    let mut store = TabularStore::acquire();
    store.load("transactions", table);

    store
}

#[test]
fn test_console_report_carries_findings_and_status() {
    let rendered = render_validation_report(&sample_report());

    assert!(rendered.contains("DATA VALIDATION REPORT: transactions"));
    assert!(rendered.contains("Records Loaded: 10"));
    assert!(rendered.contains("amount_usd: 2 nulls"));
    assert!(rendered.contains("DUPLICATES: 1 repeated keys"));
    assert!(rendered.contains("Date Range: 2025-07-01 to 2025-12-31"));
    assert!(rendered.contains("Status: WARNINGS"));
}

#[test]
fn test_validation_summary_file_has_fixed_layout() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("data_validation_summary.txt");

    write_validation_summary(&[sample_report()], &IntegrityReport::from_orphan_count(0), &path)?;

    let contents = fs::read_to_string(&path)?;

    assert!(contents.starts_with("PAYMENT CORRIDOR ANALYSIS - DATA VALIDATION SUMMARY"));
    assert!(contents.contains("Table: transactions"));
    assert!(contents.contains("Records: 10"));
    assert!(contents.contains("Null Values: 2"));
    assert!(contents.contains("Duplicates: 1"));
    assert!(contents.contains("Referential Integrity: PASS (0 orphaned transactions)"));
    assert!(contents.ends_with("Validation Complete\n"));

    Ok(())
}

#[test]
fn test_validation_summary_pluralizes_orphan_count() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("data_validation_summary.txt");

    write_validation_summary(&[sample_report()], &IntegrityReport::from_orphan_count(1), &path)?;

    let contents = fs::read_to_string(&path)?;

    assert!(contents.contains("Referential Integrity: FAIL (1 orphaned transaction)"));
    assert!(!contents.contains("1 orphaned transactions"));

    Ok(())
}

#[test]
fn test_table_csv_export_round_trips_header_and_rows() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("csv_exports").join("corridor_performance.csv");

    write_table_csv(&sample_result_table(), &path)?;

    let contents = fs::read_to_string(&path)?;
    let mut lines = contents.lines();

    assert_eq!(lines.next(), Some("corridor,txn_count,failure_rate"));
    assert_eq!(lines.next(), Some("USD_MXN,2,50"));

    Ok(())
}

#[test]
fn test_json_bundle_contains_quality_headline_and_queries() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("web_data.json");
    let store = store_with_transactions();
    let headline = headline_metrics(&store)?;

    write_summary_json(
        &[("corridor_performance", sample_result_table())],
        &[sample_report()],
        &IntegrityReport::from_orphan_count(3),
        &headline,
        &path,
    )?;

    let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;

    assert_eq!(parsed["data_quality"]["integrity"]["status"], "FAIL");
    assert_eq!(parsed["data_quality"]["integrity"]["orphaned_transactions"], 3);
    assert_eq!(parsed["data_quality"]["loads"][0]["records_loaded"], 10);
    assert_eq!(parsed["queries"]["corridor_performance"][0]["corridor"], "USD_MXN");
    assert_eq!(parsed["queries"]["corridor_performance"][0]["failure_rate"], 50.0);
    assert_eq!(parsed["headline"]["focus_corridor"], "USD_MXN");

    Ok(())
}

#[test]
fn test_headline_metrics_summarize_focus_corridor() -> Result<()> {
    let store = store_with_transactions();

    let metrics = headline_metrics(&store)?;

    assert_eq!(metrics.total_transactions, 4);
    assert_eq!(metrics.overall_failure_rate, Decimal::from(25));
    assert_eq!(metrics.focus_transactions, 2);
    assert_eq!(metrics.focus_share_pct, Decimal::from(50));
    assert_eq!(metrics.focus_failure_rate, Decimal::from(50));
    assert_eq!(metrics.focus_avg_amount, Some(Decimal::from(6250)));

    Ok(())
}

#[test]
fn test_headline_rendering_quotes_rates_as_percentages() -> Result<()> {
    let store = store_with_transactions();

    let rendered = render_headline_metrics(&headline_metrics(&store)?);

    assert!(rendered.contains("HEADLINE METRICS"));
    assert!(rendered.contains("Total Transactions: 4"));
    assert!(rendered.contains("Overall Failure Rate: 25%"));
    assert!(rendered.contains("USD_MXN Volume: 2 transactions (50% of total)"));

    Ok(())
}
