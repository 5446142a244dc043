use super::{ParseError, create_indexes, load, load_keyed};

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use tempfile::NamedTempFile;

use crate::store::TabularStore;

fn create_temporary_csv(lines: &[&str]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;

    for line in lines {
        writeln!(file, "{line}")?;
    }

    Ok(file)
}

fn transactions_csv() -> Result<NamedTempFile> {
    create_temporary_csv(&[
        "transaction_id,user_id,corridor,amount_usd,status,transaction_date,user_segment",
        "T1,U1,USD_MXN,12000,failed,2025-07-01,enterprise",
        "T2,U2,USD_MXN,500,success,2025-07-02,retail",
        "T3,U1,USD_COP,750.25,success,2025-08-15,enterprise",
    ])
}

#[test]
fn test_load_counts_every_non_header_row() -> Result<()> {
    let file = transactions_csv()?;
    let mut store = TabularStore::acquire();

    let report = load(file.path(), "transactions", &mut store)?;

    assert_eq!(report.records_loaded, 3);
    assert_eq!(report.table, "transactions");
    assert_eq!(report.columns.len(), 7);
    assert_eq!(store.table("transactions")?.len(), 3);

    Ok(())
}

#[test]
fn test_clean_file_passes_validation() -> Result<()> {
    let file = transactions_csv()?;
    let mut store = TabularStore::acquire();

    let report = load(file.path(), "transactions", &mut store)?;

    assert!(report.null_counts.is_empty());
    assert_eq!(report.duplicates, 0);
    assert_eq!(report.status.to_string(), "PASS");

    Ok(())
}

#[test]
fn test_missing_values_downgrade_status_to_warnings() -> Result<()> {
    let file = create_temporary_csv(&[
        "transaction_id,user_id,amount_usd",
        "T1,U1,100",
        "T2,,200",
        "T3,U3,",
    ])?;
    let mut store = TabularStore::acquire();

    let report = load(file.path(), "transactions", &mut store)?;

    assert_eq!(report.null_counts.get("user_id"), Some(&1));
    assert_eq!(report.null_counts.get("amount_usd"), Some(&1));
    assert_eq!(report.null_counts.get("transaction_id"), None);
    assert_eq!(report.status.to_string(), "WARNINGS");

    Ok(())
}

#[test]
fn test_duplicate_first_column_values_are_reported() -> Result<()> {
    let file = create_temporary_csv(&[
        "transaction_id,user_id,amount_usd",
        "T1,U1,100",
        "T1,U2,200",
        "T1,U3,300",
    ])?;
    let mut store = TabularStore::acquire();

    let report = load(file.path(), "transactions", &mut store)?;

    assert_eq!(report.duplicates, 2);
    assert_eq!(report.status.to_string(), "WARNINGS");

    Ok(())
}

#[test]
fn test_load_keyed_counts_duplicates_on_named_column() -> Result<()> {
    let file = transactions_csv()?;
    let mut store = TabularStore::acquire();

    let report = load_keyed(file.path(), "transactions", "user_id", &mut store)?;

    // U1 appears twice, so one repeat.
    assert_eq!(report.duplicates, 1);

    Ok(())
}

#[test]
fn test_load_keyed_rejects_unknown_key_column() -> Result<()> {
    let file = transactions_csv()?;
    let mut store = TabularStore::acquire();

    let result = load_keyed(file.path(), "transactions", "no_such_column", &mut store);

    assert!(matches!(result, Err(ParseError::KeyColumnMissing { .. })));

    Ok(())
}

#[test]
fn test_date_range_spans_first_date_column() -> Result<()> {
    let file = transactions_csv()?;
    let mut store = TabularStore::acquire();

    let report = load(file.path(), "transactions", &mut store)?;

    let expected_min = NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid date");
    let expected_max = NaiveDate::from_ymd_opt(2025, 8, 15).expect("valid date");

    assert_eq!(report.date_range, Some((expected_min, expected_max)));

    Ok(())
}

#[test]
fn test_file_without_date_column_has_no_date_range() -> Result<()> {
    let file = create_temporary_csv(&["transaction_id,amount_usd", "T1,100"])?;
    let mut store = TabularStore::acquire();

    let report = load(file.path(), "transactions", &mut store)?;

    assert!(report.date_range.is_none());

    Ok(())
}

#[test]
fn test_unparseable_date_aborts_the_load() -> Result<()> {
    let file = create_temporary_csv(&[
        "transaction_id,transaction_date",
        "T1,2025-07-01",
        "T2,not-a-date",
    ])?;
    let mut store = TabularStore::acquire();

    let result = load(file.path(), "transactions", &mut store);

    assert!(matches!(result, Err(ParseError::InvalidDate { .. })));

    Ok(())
}

#[test]
fn test_missing_file_propagates_io_error() {
    let mut store = TabularStore::acquire();

    let result = load(Path::new("does_not_exist.csv"), "transactions", &mut store);

    assert!(matches!(result, Err(ParseError::Io { .. })));
}

#[test]
fn test_ragged_row_propagates_csv_error() -> Result<()> {
    let file = create_temporary_csv(&[
        "transaction_id,user_id,amount_usd",
        "T1,U1,100",
        "T2,U2",
    ])?;
    let mut store = TabularStore::acquire();

    let result = load(file.path(), "transactions", &mut store);

    assert!(matches!(result, Err(ParseError::Csv(_))));

    Ok(())
}

#[test]
fn test_reloading_the_same_file_is_idempotent() -> Result<()> {
    let file = transactions_csv()?;
    let mut store = TabularStore::acquire();

    load(file.path(), "transactions", &mut store)?;
    let first = store.table("transactions")?.clone();

    let report = load(file.path(), "transactions", &mut store)?;
    let second = store.table("transactions")?;

    assert_eq!(&first, second);
    assert_eq!(report.records_loaded, 3);

    Ok(())
}

#[test]
fn test_create_indexes_covers_catalog_columns_and_repeats_safely() -> Result<()> {
    let transactions = transactions_csv()?;
    let users = create_temporary_csv(&[
        "user_id,user_segment,country,status,registration_date",
        "U1,enterprise,MX,active,2024-01-10",
        "U2,retail,CO,active,2024-02-20",
    ])?;
    let mut store = TabularStore::acquire();

    load(transactions.path(), "transactions", &mut store)?;
    load(users.path(), "users", &mut store)?;

    create_indexes(&mut store)?;
    create_indexes(&mut store)?;

    assert!(store.index("transactions", "corridor").is_some());
    assert!(store.index("transactions", "user_id").is_some());
    assert!(store.index("users", "user_id").is_some());
    assert!(store.index("users", "country").is_some());

    Ok(())
}
