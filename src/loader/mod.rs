mod errors;
#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use tracing::info;

pub use errors::ParseError;

use crate::models::ValidationReport;
use crate::store::{StoreError, TabularStore, Table, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The fixed set of (table, column) secondary indexes the query catalog
/// leans on.
const INDEX_SPECS: [(&str, &str); 8] = [
    ("transactions", "corridor"),
    ("transactions", "user_id"),
    ("transactions", "status"),
    ("transactions", "transaction_date"),
    ("transactions", "user_segment"),
    ("users", "user_id"),
    ("users", "user_segment"),
    ("users", "country"),
];

/// Loads a delimited file into the store, replacing the destination table,
/// and returns a validation report for it.
///
/// Duplicate detection runs on the first column, mirroring the historical
/// convention that the identifier comes first. Callers that know better
/// should use [`load_keyed`].
pub fn load(path: &Path, table_name: &str, store: &mut TabularStore) -> Result<ValidationReport, ParseError> {
    load_inner(path, table_name, None, store)
}

/// Same as [`load`], but the caller names the column used for duplicate
/// detection instead of relying on column position.
pub fn load_keyed(
    path: &Path,
    table_name: &str,
    key_column: &str,
    store: &mut TabularStore,
) -> Result<ValidationReport, ParseError> {
    load_inner(path, table_name, Some(key_column), store)
}

fn load_inner(
    path: &Path,
    table_name: &str,
    key_column: Option<&str>,
    store: &mut TabularStore,
) -> Result<ValidationReport, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(BufReader::new(file));

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    if columns.is_empty() {
        return Err(ParseError::EmptyHeader {
            path: path.to_path_buf(),
        });
    }

    let key_id = match key_column {
        Some(name) => columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| ParseError::KeyColumnMissing {
                path: path.to_path_buf(),
                column: name.to_string(),
            })?,
        None => 0,
    };

    let date_id = columns.iter().position(|column| column.to_lowercase().contains("date"));

    let mut table = Table::new(columns.clone());
    let mut null_counts = vec![0usize; columns.len()];
    let mut seen_keys = HashSet::new();
    let mut duplicates = 0usize;
    let mut date_range: Option<(NaiveDate, NaiveDate)> = None;

    for record in reader.records() {
        let record = record?;
        let row: Vec<Value> = record.iter().map(Value::parse).collect();

        for (column_id, value) in row.iter().enumerate() {
            if value.is_null() {
                null_counts[column_id] += 1;
            }
        }

        if !seen_keys.insert(row[key_id].clone()) {
            duplicates += 1;
        }

        if let Some(column_id) = date_id {
            if let Some(date) = parse_date_cell(&row[column_id], &columns[column_id])? {
                date_range = Some(match date_range {
                    None => (date, date),
                    Some((min, max)) => (min.min(date), max.max(date)),
                });
            }
        }

        table.push_row(row);
    }

    let null_counts: BTreeMap<String, usize> = columns
        .iter()
        .zip(&null_counts)
        .filter(|&(_, &count)| count > 0)
        .map(|(name, &count)| (name.clone(), count))
        .collect();

    let records_loaded = table.len();
    store.load(table_name, table);

    let status = ValidationReport::derive_status(&null_counts, duplicates);
    info!("Loaded {records_loaded} records into [{table_name}] with status [{status}]");

    Ok(ValidationReport {
        file: path.to_path_buf(),
        table: table_name.to_string(),
        records_loaded,
        columns,
        null_counts,
        duplicates,
        date_range,
        status,
    })
}

fn parse_date_cell(value: &Value, column: &str) -> Result<Option<NaiveDate>, ParseError> {
    if value.is_null() {
        return Ok(None);
    }

    let raw = value.to_string();

    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map(Some)
        .map_err(|source| ParseError::InvalidDate {
            column: column.to_string(),
            value: raw,
            source,
        })
}

/// Creates the secondary indexes used by the query catalog. Idempotent:
/// indexes that already exist are left untouched.
pub fn create_indexes(store: &mut TabularStore) -> Result<(), StoreError> {
    for (table, column) in INDEX_SPECS {
        store.create_index(table, column)?;
    }

    Ok(())
}
