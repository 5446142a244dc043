use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{IntegrityStatus, LoadStatus};

/// Validation findings for a single loaded file.
///
/// Produced once per load and handed straight to reporting; the store keeps
/// no copy of it.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub file: PathBuf,
    pub table: String,
    pub records_loaded: usize,
    pub columns: Vec<String>,
    /// Only columns with at least one missing value appear here.
    pub null_counts: BTreeMap<String, usize>,
    /// Rows whose key value repeats one seen earlier in the file.
    pub duplicates: usize,
    /// (min, max) over the first column whose name contains "date".
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub status: LoadStatus,
}

impl ValidationReport {
    pub fn derive_status(null_counts: &BTreeMap<String, usize>, duplicates: usize) -> LoadStatus {
        if !null_counts.is_empty() || duplicates > 0 {
            LoadStatus::Warnings
        } else {
            LoadStatus::Pass
        }
    }

    pub fn total_nulls(&self) -> usize {
        self.null_counts.values().sum()
    }
}

/// Result of the transactions-to-users foreign-key check.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IntegrityReport {
    pub orphaned_transactions: usize,
    pub status: IntegrityStatus,
}

impl IntegrityReport {
    pub fn from_orphan_count(orphaned_transactions: usize) -> Self {
        let status = if orphaned_transactions == 0 {
            IntegrityStatus::Pass
        } else {
            IntegrityStatus::Fail
        };

        Self {
            orphaned_transactions,
            status,
        }
    }
}
