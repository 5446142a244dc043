mod integrity;
mod loader;
mod models;
mod queries;
mod report;
mod store;

use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::Instant;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

use crate::models::IntegrityStatus;
use crate::queries::QueryError;
use crate::store::{StoreError, TabularStore, Table};

fn main() -> Result<()> {
    //NOTE: If I was making a much more sophisticated CLI application, I would have used the clap crate
    //      to handle the CLI parsing and execution.
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: corridor-analytics [transactions].csv [users].csv [output_dir:optional] [log_level:optional]");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        exit(1);
    }

    let transactions_path = PathBuf::from(&args[1]);
    let users_path = PathBuf::from(&args[2]);
    let output_dir = PathBuf::from(args.get(3).map(String::as_str).unwrap_or("output"));
    let log_level = args.get(4)
        .map(|s| parse_log_level(s)).unwrap_or(LevelFilter::ERROR);

    setup_logging(log_level);

    let timer = Instant::now();

    run_pipeline(&transactions_path, &users_path, &output_dir)?;

    info!("Analysis pipeline completed in: {:?}", timer.elapsed());

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: Reports go to stdout, so logging goes to stderr to keep them separable
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

/// Runs the whole linear sequence: load both files, index, check
/// integrity, materialize the focus-corridor subset, execute the catalog
/// and write every export.
fn run_pipeline(transactions_path: &Path, users_path: &Path, output_dir: &Path) -> Result<()> {
    let mut store = TabularStore::acquire();

    let transactions_report = loader::load(transactions_path, "transactions", &mut store)?;
    print!("{}", report::render_validation_report(&transactions_report));

    let users_report = loader::load(users_path, "users", &mut store)?;
    print!("{}", report::render_validation_report(&users_report));

    loader::create_indexes(&mut store)?;

    let integrity_report = integrity::check_referential_integrity(&store)?;

    if integrity_report.status == IntegrityStatus::Fail {
        // Surfaced loudly, but queries still run: the orphans are part of
        // what the analysis has to explain.
        error!(
            "REFERENTIAL INTEGRITY FAILED: {} transactions reference unknown users",
            integrity_report.orphaned_transactions
        );
    }

    queries::create_corridor_subset(&mut store, queries::FOCUS_CORRIDOR)?;

    let exports_dir = output_dir.join("csv_exports");
    let mut results: Vec<(&'static str, Table)> = Vec::new();

    for query in queries::catalog() {
        match (query.run)(&store) {
            Ok(table) => {
                report::write_table_csv(&table, &exports_dir.join(format!("{}.csv", query.name)))?;
                results.push((query.name, table));
            }
            Err(QueryError::Store(StoreError::ColumnNotFound { column, .. })) if column == "transaction_time" => {
                warn!("Skipping query [{}]: dataset has no time-of-day column", query.name);
            }
            Err(error) => return Err(error.into()),
        }
    }

    info!("Executed {} catalog queries", results.len());

    let load_reports = [transactions_report, users_report];

    report::write_validation_summary(
        &load_reports,
        &integrity_report,
        &output_dir.join("data_validation_summary.txt"),
    )?;

    let headline = report::headline_metrics(&store)?;

    report::write_summary_json(
        &results,
        &load_reports,
        &integrity_report,
        &headline,
        &output_dir.join("web_data.json"),
    )?;

    print!("{}", report::render_headline_metrics(&headline));

    Ok(())
}
