mod reports;

use std::fmt;
use std::fmt::{Display, Formatter};

use serde::Serialize;

pub use reports::{IntegrityReport, ValidationReport};

/// Outcome of loading one file. Data-quality findings never fail a load;
/// they downgrade it to `Warnings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoadStatus {
    Pass,
    Warnings,
}

impl Display for LoadStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Pass => write!(formatter, "PASS"),
            LoadStatus::Warnings => write!(formatter, "WARNINGS"),
        }
    }
}

/// Outcome of the referential integrity check. A single orphaned
/// transaction is enough to fail the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntegrityStatus {
    Pass,
    Fail,
}

impl Display for IntegrityStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityStatus::Pass => write!(formatter, "PASS"),
            IntegrityStatus::Fail => write!(formatter, "FAIL"),
        }
    }
}
