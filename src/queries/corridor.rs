use std::collections::{BTreeMap, HashMap};

use super::aggregate::{BracketScheme, GroupStats};
use super::global::day_of_week_stats;
use super::{DAY_NAMES, QueryError, column, parse_date};
use crate::store::{StoreError, TabularStore, Table, Value};

/// Name of the derived table holding one corridor's transactions.
pub fn subset_table_name(corridor: &str) -> String {
    format!("{}_txns", corridor.to_lowercase())
}

/// Materializes the corridor subset: transactions filtered to one corridor,
/// left-joined with users to pick up `user_country`, `user_status` and
/// `user_reg_date`. Transactions whose user is unknown keep null user
/// columns.
///
/// Idempotent: when the subset table already exists in this store the call
/// is a no-op, so re-running the subset step never errors or duplicates
/// rows. Returns the subset table name.
pub fn create_corridor_subset(store: &mut TabularStore, corridor: &str) -> Result<String, QueryError> {
    let name = subset_table_name(corridor);

    if store.contains_table(&name) {
        return Ok(name);
    }

    let transactions = store.table("transactions")?;
    let users = store.table("users")?;
    let corridor_id = column(transactions, "transactions", "corridor")?;
    let user_ref = column(transactions, "transactions", "user_id")?;
    let user_id = column(users, "users", "user_id")?;
    let user_country = column(users, "users", "country")?;
    let user_status = column(users, "users", "status")?;
    let user_reg = column(users, "users", "registration_date")?;

    // First matching user row wins, like a join against a unique key.
    let mut users_by_id: HashMap<&Value, &Vec<Value>> = HashMap::new();

    for row in users.rows() {
        users_by_id.entry(&row[user_id]).or_insert(row);
    }

    let mut columns: Vec<String> = transactions.columns().to_vec();
    columns.extend(["user_country", "user_status", "user_reg_date"].map(String::from));

    let mut subset = Table::new(columns);
    let corridor_value = Value::Text(corridor.to_string());

    let row_ids: Vec<usize> = match store.index("transactions", "corridor") {
        Some(index) => index.get(&corridor_value).cloned().unwrap_or_default(),
        None => transactions
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| row[corridor_id] == corridor_value)
            .map(|(row_id, _)| row_id)
            .collect(),
    };

    for row_id in row_ids {
        let row = &transactions.rows()[row_id];
        let mut joined = row.clone();

        let user = if row[user_ref].is_null() {
            None
        } else {
            users_by_id.get(&row[user_ref])
        };

        match user {
            Some(user) => {
                joined.push(user[user_country].clone());
                joined.push(user[user_status].clone());
                joined.push(user[user_reg].clone());
            }
            None => joined.extend([Value::Null, Value::Null, Value::Null]),
        }

        subset.push_row(joined);
    }

    tracing::info!("Materialized corridor subset [{}] with {} rows", name, subset.len());
    store.load(&name, subset);

    Ok(name)
}

fn subset_table<'store>(store: &'store TabularStore, corridor: &str) -> Result<(&'store Table, String), QueryError> {
    let name = subset_table_name(corridor);

    match store.table(&name) {
        Ok(table) => Ok((table, name)),
        Err(StoreError::TableNotFound(_)) => Err(QueryError::SubsetMissing { table: name }),
        Err(error) => Err(error.into()),
    }
}

/// Segment split within one corridor, worst failure rate first.
pub fn corridor_segment_analysis(store: &TabularStore, corridor: &str) -> Result<Table, QueryError> {
    let (subset, name) = subset_table(store, corridor)?;
    let segment = column(subset, &name, "user_segment")?;
    let status = column(subset, &name, "status")?;
    let amount = column(subset, &name, "amount_usd")?;

    let mut groups: BTreeMap<String, GroupStats> = BTreeMap::new();

    for row in subset.rows() {
        groups
            .entry(row[segment].to_string())
            .or_default()
            .record(row[status].as_text(), row[amount].as_number(), None);
    }

    let mut entries: Vec<_> = groups.into_iter().collect();
    entries.sort_by(|a, b| b.1.failure_rate().cmp(&a.1.failure_rate()).then_with(|| a.0.cmp(&b.0)));

    let mut result = Table::with_columns(&["user_segment", "txn_count", "failure_rate", "avg_amount", "total_value"]);

    for (segment, stats) in entries {
        result.push_row(vec![
            Value::Text(segment),
            Value::from(stats.count),
            Value::Number(stats.failure_rate()),
            stats.avg_amount(),
            Value::Number(stats.total_value()),
        ]);
    }

    Ok(result)
}

/// Failure rates across the corridor-focus amount brackets.
pub fn corridor_amount_analysis(store: &TabularStore, corridor: &str) -> Result<Table, QueryError> {
    let (subset, name) = subset_table(store, corridor)?;
    let amount = column(subset, &name, "amount_usd")?;
    let status = column(subset, &name, "status")?;

    let scheme = BracketScheme::corridor_focus();
    let mut groups: BTreeMap<usize, GroupStats> = BTreeMap::new();

    for row in subset.rows() {
        let Some(value) = row[amount].as_number() else {
            continue;
        };

        groups
            .entry(scheme.classify(value))
            .or_default()
            .record(row[status].as_text(), Some(value), None);
    }

    let mut result = Table::with_columns(&["amount_bracket", "txn_count", "failure_rate", "avg_amount"]);

    for (ordinal, stats) in groups {
        result.push_row(vec![
            Value::from(scheme.label(ordinal)),
            Value::from(stats.count),
            Value::Number(stats.failure_rate()),
            stats.avg_amount(),
        ]);
    }

    Ok(result)
}

/// Month-over-month trend within one corridor, in calendar order.
pub fn corridor_monthly_trend(store: &TabularStore, corridor: &str) -> Result<Table, QueryError> {
    let (subset, name) = subset_table(store, corridor)?;
    let date = column(subset, &name, "transaction_date")?;
    let status = column(subset, &name, "status")?;
    let amount = column(subset, &name, "amount_usd")?;

    let mut groups: BTreeMap<String, GroupStats> = BTreeMap::new();

    for row in subset.rows() {
        let Some(parsed) = parse_date(&row[date], "transaction_date")? else {
            continue;
        };

        groups
            .entry(parsed.format("%Y-%m").to_string())
            .or_default()
            .record(row[status].as_text(), row[amount].as_number(), None);
    }

    let mut result = Table::with_columns(&["month", "txn_count", "failure_rate", "avg_amount"]);

    for (month, stats) in groups {
        result.push_row(vec![
            Value::Text(month),
            Value::from(stats.count),
            Value::Number(stats.failure_rate()),
            stats.avg_amount(),
        ]);
    }

    Ok(result)
}

/// Weekly failure pattern within one corridor, Monday-first.
pub fn corridor_day_of_week(store: &TabularStore, corridor: &str) -> Result<Table, QueryError> {
    let (subset, name) = subset_table(store, corridor)?;
    let groups = day_of_week_stats(subset, &name)?;

    let mut result = Table::with_columns(&["day_of_week", "day_num", "txn_count", "failure_rate"]);

    for (day_num, stats) in groups {
        result.push_row(vec![
            Value::from(DAY_NAMES[(day_num - 1) as usize]),
            Value::from(u64::from(day_num)),
            Value::from(stats.count),
            Value::Number(stats.failure_rate()),
        ]);
    }

    Ok(result)
}

/// Failure rates by the owning user's account status within one corridor.
/// Transactions whose user was unknown at join time group under an empty
/// status.
pub fn corridor_user_status(store: &TabularStore, corridor: &str) -> Result<Table, QueryError> {
    let (subset, name) = subset_table(store, corridor)?;
    let user_status = column(subset, &name, "user_status")?;
    let status = column(subset, &name, "status")?;
    let amount = column(subset, &name, "amount_usd")?;

    let mut groups: BTreeMap<String, GroupStats> = BTreeMap::new();

    for row in subset.rows() {
        groups
            .entry(row[user_status].to_string())
            .or_default()
            .record(row[status].as_text(), row[amount].as_number(), None);
    }

    let mut result = Table::with_columns(&["user_status", "txn_count", "failure_rate", "avg_amount"]);

    for (account_status, stats) in groups {
        result.push_row(vec![
            Value::Text(account_status),
            Value::from(stats.count),
            Value::Number(stats.failure_rate()),
            stats.avg_amount(),
        ]);
    }

    Ok(result)
}
