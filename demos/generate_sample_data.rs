use std::env;
use std::fs::{File, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{Days, NaiveDate};
use rand::Rng;
use rand::seq::IndexedRandom;

const CORRIDORS: [&str; 5] = ["USD_MXN", "USD_COP", "USD_BRL", "MXN_COP", "USD_GTQ"];
const SEGMENTS: [&str; 3] = ["retail", "sme", "enterprise"];
const COUNTRIES: [&str; 5] = ["MX", "CO", "BR", "GT", "US"];

const ANALYSIS_DAYS: u64 = 184;

struct GeneratorConfig {
    num_transactions: usize,
    num_users: usize,
    output_dir: String,
}

impl GeneratorConfig {
    fn from_args() -> Self {
        let args: Vec<String> = env::args().collect();
        let num_transactions = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(50_000);
        let num_users = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5_000);

        Self {
            num_transactions,
            num_users,
            output_dir: args.get(3).cloned().unwrap_or_else(|| "data/raw".to_string()),
        }
    }
}

fn main() -> io::Result<()> {
    let config = GeneratorConfig::from_args();

    println!(
        "Generating {} transactions across {} users in {}/...",
        config.num_transactions, config.num_users, config.output_dir
    );

    create_dir_all(&config.output_dir)?;

    let mut rng = rand::rng();
    let period_start = NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid period start");

    let user_segments = generate_users(&config, &mut rng, period_start)?;
    generate_transactions(&config, &mut rng, period_start, &user_segments)?;

    println!("Generation complete.");

    Ok(())
}

fn generate_users<R: Rng>(
    config: &GeneratorConfig,
    rng: &mut R,
    period_start: NaiveDate,
) -> io::Result<Vec<&'static str>> {
    let path = Path::new(&config.output_dir).join("users.csv");
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "user_id,user_segment,country,status,registration_date")?;

    let mut segments = Vec::with_capacity(config.num_users);

    for user in 1..=config.num_users {
        let segment = *SEGMENTS.choose(rng).expect("segments are non-empty");
        let country = COUNTRIES.choose(rng).expect("countries are non-empty");
        let status = if rng.random_bool(0.92) { "active" } else { "inactive" };
        let registered = period_start
            .checked_sub_days(Days::new(rng.random_range(30..720)))
            .expect("registration date in range");

        writeln!(writer, "USR_{user:04},{segment},{country},{status},{registered}")?;
        segments.push(segment);
    }

    writer.flush()?;

    Ok(segments)
}

fn generate_transactions<R: Rng>(
    config: &GeneratorConfig,
    rng: &mut R,
    period_start: NaiveDate,
    user_segments: &[&'static str],
) -> io::Result<()> {
    let path = Path::new(&config.output_dir).join("transactions.csv");
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(
        writer,
        "transaction_id,user_id,corridor,amount_usd,status,transaction_date,transaction_time,user_segment"
    )?;

    for txn in 1..=config.num_transactions {
        let user = rng.random_range(1..=user_segments.len());
        let segment = user_segments[user - 1];
        let corridor = *CORRIDORS.choose(rng).expect("corridors are non-empty");

        let amount: f64 = match segment {
            "enterprise" => rng.random_range(2_000.0..40_000.0),
            "sme" => rng.random_range(500.0..12_000.0),
            _ => rng.random_range(50.0..3_000.0),
        };

        // USD_MXN large-ticket payments fail far more often, which is the
        // anomaly the analysis is meant to surface.
        let failure_probability = match (corridor, amount > 10_000.0) {
            ("USD_MXN", true) => 0.35,
            ("USD_MXN", false) => 0.12,
            _ => 0.05,
        };
        let status = if rng.random_bool(failure_probability) { "failed" } else { "success" };

        let date = period_start
            .checked_add_days(Days::new(rng.random_range(0..ANALYSIS_DAYS)))
            .expect("transaction date in range");
        let hour = rng.random_range(6..22);
        let minute = rng.random_range(0..60);
        let second = rng.random_range(0..60);

        writeln!(
            writer,
            "TXN_{txn:06},USR_{user:04},{corridor},{amount:.2},{status},{date},{hour:02}:{minute:02}:{second:02},{segment}"
        )?;
    }

    writer.flush()?;

    Ok(())
}
