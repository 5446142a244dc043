
use std::collections::HashSet;

use tracing::{info, warn};

use crate::models::{IntegrityReport, IntegrityStatus};
use crate::store::{StoreError, TabularStore, Value};

/// Counts transactions whose `user_id` has no matching row in `users` and
/// derives a PASS/FAIL status from the count.
///
/// A left-exclusive join: a transaction with a null user id can match
/// nothing and counts as orphaned. Pure read, the store is untouched.
pub fn check_referential_integrity(store: &TabularStore) -> Result<IntegrityReport, StoreError> {
    let transactions = store.table("transactions")?;
    let users = store.table("users")?;

    let txn_user_id = transactions
        .column_index("user_id")
        .ok_or_else(|| StoreError::ColumnNotFound {
            table: "transactions".to_string(),
            column: "user_id".to_string(),
        })?;

    let orphaned = match store.index("users", "user_id") {
        Some(index) => transactions
            .rows()
            .iter()
            .filter(|row| row[txn_user_id].is_null() || !index.contains_key(&row[txn_user_id]))
            .count(),
        None => {
            let user_id = users
                .column_index("user_id")
                .ok_or_else(|| StoreError::ColumnNotFound {
                    table: "users".to_string(),
                    column: "user_id".to_string(),
                })?;

            let known: HashSet<&Value> = users.rows().iter().map(|row| &row[user_id]).collect();

            transactions
                .rows()
                .iter()
                .filter(|row| row[txn_user_id].is_null() || !known.contains(&row[txn_user_id]))
                .count()
        }
    };

    let report = IntegrityReport::from_orphan_count(orphaned);

    match report.status {
        IntegrityStatus::Pass => info!("Referential integrity check passed"),
        IntegrityStatus::Fail => warn!("Referential integrity check found {orphaned} orphaned transactions"),
    }

    Ok(report)
}
