pub(crate) mod aggregate;
mod corridor;
mod global;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

pub use corridor::{
    corridor_amount_analysis, corridor_day_of_week, corridor_monthly_trend, corridor_segment_analysis,
    corridor_user_status, create_corridor_subset, subset_table_name,
};
pub use global::{
    amount_distribution, corridor_performance, corridor_strategic_comparison, daily_trend, day_of_week_pattern,
    hourly_pattern, record_counts, user_segment_analysis,
};

use crate::store::{StoreError, TabularStore, Table, Value};

/// The corridor the root-cause portion of the analysis drills into.
pub const FOCUS_CORRIDOR: &str = "USD_MXN";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Corridor subset table [{table}] has not been created")]
    SubsetMissing { table: String },
    #[error("Invalid date [{value}] in column [{column}]")]
    InvalidDate { column: String, value: String },
    #[error("Invalid time [{value}] in column [{column}]")]
    InvalidTime { column: String, value: String },
}

/// A named, parameterless entry in the query catalog.
pub struct QueryDef {
    pub name: &'static str,
    pub run: fn(&TabularStore) -> Result<Table, QueryError>,
}

/// The full catalog, in the order results are reported and exported.
/// Corridor-scoped entries are bound to [`FOCUS_CORRIDOR`]; run
/// [`create_corridor_subset`] before executing them.
pub fn catalog() -> Vec<QueryDef> {
    vec![
        QueryDef { name: "corridor_performance", run: corridor_performance },
        QueryDef { name: "user_segment_analysis", run: user_segment_analysis },
        QueryDef { name: "daily_trend", run: daily_trend },
        QueryDef { name: "day_of_week_pattern", run: day_of_week_pattern },
        QueryDef { name: "hourly_pattern", run: hourly_pattern },
        QueryDef { name: "amount_distribution", run: amount_distribution },
        QueryDef { name: "usd_mxn_segments", run: |store| corridor_segment_analysis(store, FOCUS_CORRIDOR) },
        QueryDef { name: "usd_mxn_amounts", run: |store| corridor_amount_analysis(store, FOCUS_CORRIDOR) },
        QueryDef { name: "usd_mxn_monthly", run: |store| corridor_monthly_trend(store, FOCUS_CORRIDOR) },
        QueryDef { name: "usd_mxn_day_of_week", run: |store| corridor_day_of_week(store, FOCUS_CORRIDOR) },
        QueryDef { name: "usd_mxn_user_status", run: |store| corridor_user_status(store, FOCUS_CORRIDOR) },
        QueryDef { name: "corridor_comparison", run: corridor_strategic_comparison },
        QueryDef { name: "record_counts", run: record_counts },
    ]
}

/// Calendar day names, Monday-first, aligned with `day_num` values 1-7.
pub(crate) const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub(crate) fn column(table: &Table, table_name: &str, name: &str) -> Result<usize, QueryError> {
    table
        .column_index(name)
        .ok_or_else(|| {
            StoreError::ColumnNotFound {
                table: table_name.to_string(),
                column: name.to_string(),
            }
            .into()
        })
}

/// Grouping key for one cell; `None` drops null cells from distinct counts.
pub(crate) fn non_null_key(value: &Value) -> Option<String> {
    if value.is_null() {
        return None;
    }

    Some(value.to_string())
}

/// Parses a transaction date cell. Nulls are skipped by callers; anything
/// else must be an ISO-8601 calendar date.
pub(crate) fn parse_date(value: &Value, column: &str) -> Result<Option<NaiveDate>, QueryError> {
    if value.is_null() {
        return Ok(None);
    }

    let raw = value.to_string();

    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| QueryError::InvalidDate {
            column: column.to_string(),
            value: raw,
        })
}

/// Monday-first day number (1-7) for a date.
pub(crate) fn day_number(date: NaiveDate) -> u32 {
    date.weekday().number_from_monday()
}
