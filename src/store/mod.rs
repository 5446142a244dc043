mod table;
#[cfg(test)]
mod tests;

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

pub use table::{Table, Value};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Table [{0}] does not exist in the store")]
    TableNotFound(String),
    #[error("Column [{column}] does not exist in table [{table}]")]
    ColumnNotFound { table: String, column: String },
}

/// Secondary index: every distinct column value mapped to the row ids
/// (in file order) that carry it.
pub type ColumnIndex = HashMap<Value, Vec<usize>>;

/// In-memory relational store holding named tables for the duration of one
/// run. Nothing persists across process restarts.
pub struct TabularStore {
    tables: HashMap<String, Table>,
    indexes: HashMap<(String, String), ColumnIndex>,
}

impl TabularStore {
    /// Returns a fresh, empty store.
    ///
    /// Every run acquires its own private store; there is no shared or
    /// ambient instance.
    pub fn acquire() -> Self {
        Self {
            tables: HashMap::new(),
            indexes: HashMap::new(),
        }
    }

    /// Replaces the named table wholesale.
    ///
    /// Reloading a table is idempotent: rows are never appended to an
    /// existing table. Secondary indexes on the replaced table are dropped,
    /// since they refer to row ids that no longer exist.
    pub fn load(&mut self, name: &str, table: Table) {
        debug!("Storing table [{}] with {} rows", name, table.len());
        self.tables.insert(name.to_string(), table);
        self.indexes.retain(|(indexed_table, _), _| indexed_table != name);
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table(&self, name: &str) -> Result<&Table, StoreError> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    /// Builds a secondary index over one column. A no-op when the index
    /// already exists.
    pub fn create_index(&mut self, table_name: &str, column: &str) -> Result<(), StoreError> {
        let key = (table_name.to_string(), column.to_string());

        if self.indexes.contains_key(&key) {
            return Ok(());
        }

        let table = self
            .tables
            .get(table_name)
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;

        let column_id = table
            .column_index(column)
            .ok_or_else(|| StoreError::ColumnNotFound {
                table: table_name.to_string(),
                column: column.to_string(),
            })?;

        let mut index = ColumnIndex::new();

        for (row_id, row) in table.rows().iter().enumerate() {
            index.entry(row[column_id].clone()).or_default().push(row_id);
        }

        debug!("Created index on [{}]({}) with {} distinct keys", table_name, column, index.len());
        self.indexes.insert(key, index);

        Ok(())
    }

    pub fn index(&self, table_name: &str, column: &str) -> Option<&ColumnIndex> {
        self.indexes
            .get(&(table_name.to_string(), column.to_string()))
    }
}
