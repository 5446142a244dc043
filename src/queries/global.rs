use std::collections::{BTreeMap, HashSet};

use chrono::Timelike;
use rust_decimal::Decimal;

use super::aggregate::{BracketScheme, GroupStats, round2};
use super::{DAY_NAMES, QueryError, column, day_number, non_null_key, parse_date};
use crate::store::{TabularStore, Table, Value};

/// Strategic-comparison growth windows: transaction counts before the end
/// of the early window are compared against counts from the late window on.
const EARLY_WINDOW_END: &str = "2025-09-01";
const LATE_WINDOW_START: &str = "2025-11-01";

/// Per-corridor performance: volume, outcome split, failure rate, value and
/// fee revenue (0.5% of successfully settled value). Ordered by volume
/// descending, corridor ascending on ties.
pub fn corridor_performance(store: &TabularStore) -> Result<Table, QueryError> {
    let transactions = store.table("transactions")?;
    let corridor = column(transactions, "transactions", "corridor")?;
    let status = column(transactions, "transactions", "status")?;
    let amount = column(transactions, "transactions", "amount_usd")?;

    let mut groups: BTreeMap<String, GroupStats> = BTreeMap::new();

    for row in transactions.rows() {
        groups
            .entry(row[corridor].to_string())
            .or_default()
            .record(row[status].as_text(), row[amount].as_number(), None);
    }

    let mut entries: Vec<_> = groups.into_iter().collect();
    entries.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));

    let mut result = Table::with_columns(&[
        "corridor",
        "total_transactions",
        "successful",
        "failed",
        "failure_rate",
        "avg_amount",
        "total_value",
        "revenue_usd",
    ]);

    for (corridor, stats) in entries {
        result.push_row(vec![
            Value::Text(corridor),
            Value::from(stats.count),
            Value::from(stats.successful),
            Value::from(stats.failed),
            Value::Number(stats.failure_rate()),
            stats.avg_amount(),
            Value::Number(stats.total_value()),
            Value::Number(stats.revenue()),
        ]);
    }

    Ok(result)
}

/// Transaction behavior by user segment, including the distinct-user count
/// behind the per-user intensity figure. Ordered by volume descending.
pub fn user_segment_analysis(store: &TabularStore) -> Result<Table, QueryError> {
    let transactions = store.table("transactions")?;
    let segment = column(transactions, "transactions", "user_segment")?;
    let user_id = column(transactions, "transactions", "user_id")?;
    let status = column(transactions, "transactions", "status")?;
    let amount = column(transactions, "transactions", "amount_usd")?;

    let mut groups: BTreeMap<String, GroupStats> = BTreeMap::new();

    for row in transactions.rows() {
        groups.entry(row[segment].to_string()).or_default().record(
            row[status].as_text(),
            row[amount].as_number(),
            non_null_key(&row[user_id]),
        );
    }

    let mut entries: Vec<_> = groups.into_iter().collect();
    entries.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));

    let mut result = Table::with_columns(&[
        "user_segment",
        "unique_users",
        "total_transactions",
        "avg_txns_per_user",
        "avg_amount",
        "failure_rate",
    ]);

    for (segment, stats) in entries {
        result.push_row(vec![
            Value::Text(segment),
            Value::from(stats.unique_users()),
            Value::from(stats.count),
            stats.avg_txns_per_user(),
            stats.avg_amount(),
            Value::Number(stats.failure_rate()),
        ]);
    }

    Ok(result)
}

/// Daily volume, outcome split and value, in calendar order.
pub fn daily_trend(store: &TabularStore) -> Result<Table, QueryError> {
    let transactions = store.table("transactions")?;
    let date = column(transactions, "transactions", "transaction_date")?;
    let status = column(transactions, "transactions", "status")?;
    let amount = column(transactions, "transactions", "amount_usd")?;

    // ISO dates sort correctly as text, so the BTreeMap order is already
    // chronological.
    let mut groups: BTreeMap<String, GroupStats> = BTreeMap::new();

    for row in transactions.rows() {
        groups
            .entry(row[date].to_string())
            .or_default()
            .record(row[status].as_text(), row[amount].as_number(), None);
    }

    let mut result = Table::with_columns(&[
        "transaction_date",
        "txn_count",
        "successful",
        "failed",
        "failure_rate",
        "total_value",
    ]);

    for (day, stats) in groups {
        result.push_row(vec![
            Value::Text(day),
            Value::from(stats.count),
            Value::from(stats.successful),
            Value::from(stats.failed),
            Value::Number(stats.failure_rate()),
            Value::Number(stats.total_value()),
        ]);
    }

    Ok(result)
}

pub(crate) fn day_of_week_stats(
    table: &Table,
    table_name: &str,
) -> Result<BTreeMap<u32, GroupStats>, QueryError> {
    let date = column(table, table_name, "transaction_date")?;
    let status = column(table, table_name, "status")?;
    let amount = column(table, table_name, "amount_usd")?;

    let mut groups: BTreeMap<u32, GroupStats> = BTreeMap::new();

    for row in table.rows() {
        let Some(parsed) = parse_date(&row[date], "transaction_date")? else {
            continue;
        };

        groups
            .entry(day_number(parsed))
            .or_default()
            .record(row[status].as_text(), row[amount].as_number(), None);
    }

    Ok(groups)
}

/// Weekly rhythm of volume, failure rate and ticket size, Monday-first.
pub fn day_of_week_pattern(store: &TabularStore) -> Result<Table, QueryError> {
    let transactions = store.table("transactions")?;
    let groups = day_of_week_stats(transactions, "transactions")?;

    let mut result = Table::with_columns(&["day_of_week", "day_num", "txn_count", "failure_rate", "avg_amount"]);

    for (day_num, stats) in groups {
        result.push_row(vec![
            Value::from(DAY_NAMES[(day_num - 1) as usize]),
            Value::from(u64::from(day_num)),
            Value::from(stats.count),
            Value::Number(stats.failure_rate()),
            stats.avg_amount(),
        ]);
    }

    Ok(result)
}

/// Hour-of-day pattern over `transaction_time`. Datasets without a
/// time-of-day column fail with `ColumnNotFound`; the pipeline treats that
/// as "skip this query".
pub fn hourly_pattern(store: &TabularStore) -> Result<Table, QueryError> {
    let transactions = store.table("transactions")?;
    let time = column(transactions, "transactions", "transaction_time")?;
    let status = column(transactions, "transactions", "status")?;
    let amount = column(transactions, "transactions", "amount_usd")?;

    let mut groups: BTreeMap<u32, GroupStats> = BTreeMap::new();

    for row in transactions.rows() {
        if row[time].is_null() {
            continue;
        }

        let raw = row[time].to_string();
        let parsed = chrono::NaiveTime::parse_from_str(&raw, "%H:%M:%S").map_err(|_| QueryError::InvalidTime {
            column: "transaction_time".to_string(),
            value: raw,
        })?;

        groups
            .entry(parsed.hour())
            .or_default()
            .record(row[status].as_text(), row[amount].as_number(), None);
    }

    let mut result = Table::with_columns(&["hour", "txn_count", "failure_rate", "avg_amount"]);

    for (hour, stats) in groups {
        result.push_row(vec![
            Value::from(u64::from(hour)),
            Value::from(stats.count),
            Value::Number(stats.failure_rate()),
            stats.avg_amount(),
        ]);
    }

    Ok(result)
}

/// Distribution across the standard amount brackets, ordered by each
/// bracket's lower bound. Rows without an amount have nothing to bucket
/// and are skipped.
pub fn amount_distribution(store: &TabularStore) -> Result<Table, QueryError> {
    let transactions = store.table("transactions")?;
    let amount = column(transactions, "transactions", "amount_usd")?;
    let status = column(transactions, "transactions", "status")?;

    let scheme = BracketScheme::standard();
    let mut groups: BTreeMap<usize, GroupStats> = BTreeMap::new();

    for row in transactions.rows() {
        let Some(value) = row[amount].as_number() else {
            continue;
        };

        groups
            .entry(scheme.classify(value))
            .or_default()
            .record(row[status].as_text(), Some(value), None);
    }

    let mut result = Table::with_columns(&["amount_bracket", "txn_count", "failure_rate", "avg_amount", "min_amount"]);

    for (ordinal, stats) in groups {
        result.push_row(vec![
            Value::from(scheme.label(ordinal)),
            Value::from(stats.count),
            Value::Number(stats.failure_rate()),
            stats.avg_amount(),
            stats.min_amount(),
        ]);
    }

    Ok(result)
}

/// Side-by-side corridor comparison for prioritization: volume, value,
/// success rate, revenue potential and growth between the early and late
/// date windows. Ordered by revenue potential descending.
pub fn corridor_strategic_comparison(store: &TabularStore) -> Result<Table, QueryError> {
    let transactions = store.table("transactions")?;
    let corridor = column(transactions, "transactions", "corridor")?;
    let status = column(transactions, "transactions", "status")?;
    let amount = column(transactions, "transactions", "amount_usd")?;
    let date = column(transactions, "transactions", "transaction_date")?;

    struct CorridorWindowed {
        stats: GroupStats,
        early: u64,
        late: u64,
    }

    let mut groups: BTreeMap<String, CorridorWindowed> = BTreeMap::new();

    for row in transactions.rows() {
        let entry = groups.entry(row[corridor].to_string()).or_insert_with(|| CorridorWindowed {
            stats: GroupStats::default(),
            early: 0,
            late: 0,
        });

        entry.stats.record(row[status].as_text(), row[amount].as_number(), None);

        // ISO date text compares chronologically.
        if let Some(day) = row[date].as_text() {
            if day < EARLY_WINDOW_END {
                entry.early += 1;
            }

            if day >= LATE_WINDOW_START {
                entry.late += 1;
            }
        }
    }

    let mut entries: Vec<_> = groups.into_iter().collect();
    entries.sort_by(|a, b| {
        b.1.stats
            .revenue()
            .cmp(&a.1.stats.revenue())
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut result = Table::with_columns(&[
        "corridor",
        "volume",
        "avg_amount",
        "total_value",
        "success_rate",
        "revenue_potential",
        "growth_rate",
    ]);

    for (corridor, entry) in entries {
        let growth_rate = if entry.early == 0 {
            Value::Null
        } else {
            Value::Number(round2(
                Decimal::from(entry.late) * Decimal::ONE_HUNDRED / Decimal::from(entry.early) - Decimal::ONE_HUNDRED,
            ))
        };

        result.push_row(vec![
            Value::Text(corridor),
            Value::from(entry.stats.count),
            entry.stats.avg_amount(),
            Value::Number(entry.stats.total_value()),
            Value::Number(entry.stats.success_rate()),
            Value::Number(entry.stats.revenue()),
            growth_rate,
        ]);
    }

    Ok(result)
}

/// One-row sanity counts used to cross-check the loaded dataset.
pub fn record_counts(store: &TabularStore) -> Result<Table, QueryError> {
    let transactions = store.table("transactions")?;
    let users = store.table("users")?;
    let user_id = column(transactions, "transactions", "user_id")?;

    let distinct_users: HashSet<String> = transactions
        .rows()
        .iter()
        .filter_map(|row| non_null_key(&row[user_id]))
        .collect();

    let mut result = Table::with_columns(&["total_transactions", "unique_users_in_txns", "total_users"]);

    result.push_row(vec![
        Value::from(transactions.len() as u64),
        Value::from(distinct_users.len() as u64),
        Value::from(users.len() as u64),
    ]);

    Ok(result)
}
