use super::{StoreError, TabularStore, Table, Value};

use anyhow::Result;
use rust_decimal::Decimal;

fn sample_table(rows: &[&[&str]]) -> Table {
    let mut table = Table::with_columns(&["transaction_id", "corridor", "amount_usd"]);

    for row in rows {
        table.push_row(row.iter().map(|cell| Value::parse(cell)).collect());
    }

    table
}

#[test]
fn test_acquire_returns_empty_store() {
    let store = TabularStore::acquire();

    assert!(!store.contains_table("transactions"));
    assert!(matches!(store.table("transactions"), Err(StoreError::TableNotFound(_))));
}

#[test]
fn test_load_full_replaces_existing_table() -> Result<()> {
    let mut store = TabularStore::acquire();
    store.load("transactions", sample_table(&[&["T1", "USD_MXN", "100"], &["T2", "USD_COP", "200"]]));
    store.load("transactions", sample_table(&[&["T3", "USD_MXN", "300"]]));

    let table = store.table("transactions")?;

    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0][0], Value::Text("T3".to_string()));

    Ok(())
}

#[test]
fn test_create_index_groups_row_ids_by_value() -> Result<()> {
    let mut store = TabularStore::acquire();
    store.load(
        "transactions",
        sample_table(&[&["T1", "USD_MXN", "100"], &["T2", "USD_COP", "200"], &["T3", "USD_MXN", "300"]]),
    );

    store.create_index("transactions", "corridor")?;

    let index = store.index("transactions", "corridor").expect("index missing");

    assert_eq!(index.len(), 2);
    assert_eq!(index[&Value::Text("USD_MXN".to_string())], vec![0, 2]);
    assert_eq!(index[&Value::Text("USD_COP".to_string())], vec![1]);

    Ok(())
}

#[test]
fn test_create_index_is_idempotent() -> Result<()> {
    let mut store = TabularStore::acquire();
    store.load("transactions", sample_table(&[&["T1", "USD_MXN", "100"]]));

    store.create_index("transactions", "corridor")?;
    store.create_index("transactions", "corridor")?;

    let index = store.index("transactions", "corridor").expect("index missing");

    assert_eq!(index[&Value::Text("USD_MXN".to_string())], vec![0]);

    Ok(())
}

#[test]
fn test_reload_drops_stale_indexes() -> Result<()> {
    let mut store = TabularStore::acquire();
    store.load("transactions", sample_table(&[&["T1", "USD_MXN", "100"]]));
    store.create_index("transactions", "corridor")?;

    store.load("transactions", sample_table(&[&["T2", "USD_COP", "200"]]));

    assert!(store.index("transactions", "corridor").is_none());

    Ok(())
}

#[test]
fn test_create_index_rejects_unknown_column() {
    let mut store = TabularStore::acquire();
    store.load("transactions", sample_table(&[&["T1", "USD_MXN", "100"]]));

    let result = store.create_index("transactions", "no_such_column");

    assert!(matches!(result, Err(StoreError::ColumnNotFound { .. })));
}

#[test]
fn test_value_parse_infers_cell_types() -> Result<()> {
    assert_eq!(Value::parse(""), Value::Null);
    assert_eq!(Value::parse("USD_MXN"), Value::Text("USD_MXN".to_string()));
    assert_eq!(Value::parse("12000.50"), Value::Number(Decimal::from_str_exact("12000.50")?));
    assert_eq!(Value::parse("2025-07-01"), Value::Text("2025-07-01".to_string()));

    Ok(())
}

#[test]
fn test_value_display_renders_null_as_empty() {
    assert_eq!(Value::Null.to_string(), "");
    assert_eq!(Value::from("retail").to_string(), "retail");
    assert_eq!(Value::from(42u64).to_string(), "42");
}
