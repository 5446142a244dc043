use std::path::PathBuf;

use thiserror::Error;

/// Structural load failures. These abort the run; data-quality findings
/// (nulls, duplicates) are `ValidationReport` fields instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Could not open source file [{}]", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed delimited data: {0}")]
    Csv(#[from] csv::Error),
    #[error("Source file [{}] has no header columns", .path.display())]
    EmptyHeader { path: PathBuf },
    #[error("Key column [{column}] is not present in [{}]", .path.display())]
    KeyColumnMissing { path: PathBuf, column: String },
    #[error("Invalid date [{value}] in column [{column}]")]
    InvalidDate {
        column: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
