//! asset-settlement CLI
//!
//! Settle asset ledgers from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Settle one account for a period, falling back to a manual rate
//! asset-settlement settle --input data/alice.csv --start 2024-05-01 --end 2024-05-15 --manual-rate 36.5
//!
//! # Use a config file and print the report as JSON
//! asset-settlement settle --input data/alice.csv --config settlement.json --format json
//!
//! # Generate a demo ledger
//! asset-settlement generate --days 30 --output data/demo.csv
//! ```

use asset_settlement::audit::period::SettlementPeriod;
use asset_settlement::config::SettlementConfig;
use asset_settlement::ingest::csv_source::CsvSource;
use asset_settlement::ingest::normalizer::parse_date;
use asset_settlement::settlement::pipeline::{RunRequest, SettlementPipeline};
use asset_settlement::simulation::ledger_generator::{generate_ledger, write_csv, LedgerConfig};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::process;

fn print_usage() {
    eprintln!(
        r#"asset-settlement — audited settlement of asset ledgers

USAGE:
    asset-settlement <COMMAND> [OPTIONS]

COMMANDS:
    settle      Settle one account's ledgers into a persisted report
    generate    Generate a random ledger CSV (for testing)
    help        Show this message

OPTIONS (settle):
    --input <FILE>          Ledger CSV; repeat for several files (required)
    --account <ID>          Account id (default: first input's file name)
    --config <FILE>         JSON configuration file
    --start <DATE>          First day of the settlement period (YYYY-MM-DD)
    --end <DATE>            Last day of the settlement period (YYYY-MM-DD)
    --rate-url <URL>        Official rate endpoint returning {{"rate": ...}}
    --manual-rate <RATE>    Fallback rate if the endpoint fails
    --offline               Skip the rate endpoint, use the manual rate
    --liquidity-rate <F>    Override the liquidity rate (default 0.75)
    --fee <F>               Override the operational fee (default 0.10)
    --spread <F>            Override the spread factor (default 1.824)
    --output-dir <DIR>      Report directory (default: history_reports)
    --format <FORMAT>       Echo the report as text (default) or json

OPTIONS (generate):
    --days <N>              Days covered (default: 14)
    --rows-per-day <N>      Rows per day (default: 8)
    --start <DATE>          First day (default: 2024-01-01)
    --bonus-ratio <F>       Share of non-liquidable rows (default: 0.05)
    --malformed-ratio <F>   Share of rows with a bad amount (default: 0)
    --output <FILE>         Write to file instead of stdout

ENVIRONMENT:
    RUST_LOG                Log filter (default: info)

EXAMPLES:
    asset-settlement settle --input data/alice.csv --manual-rate 36.5
    asset-settlement settle --input a.csv --input b.csv --account ALICE --start 2024-05-01 --end 2024-05-15
    asset-settlement generate --days 30 --output data/demo.csv"#
    );
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn value_of(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    args.get(*i)
        .cloned()
        .unwrap_or_else(|| fail(format!("{} requires a value", flag)))
}

fn decimal_of(args: &[String], i: &mut usize, flag: &str) -> Decimal {
    let raw = value_of(args, i, flag);
    raw.trim()
        .parse()
        .unwrap_or_else(|_| fail(format!("{} expects a number, got '{}'", flag, raw)))
}

fn date_of(args: &[String], i: &mut usize, flag: &str) -> NaiveDate {
    let raw = value_of(args, i, flag);
    parse_date(&raw).unwrap_or_else(|| fail(format!("{} expects YYYY-MM-DD, got '{}'", flag, raw)))
}

fn ratio_of(args: &[String], i: &mut usize, flag: &str) -> f64 {
    let raw = value_of(args, i, flag);
    match raw.parse::<f64>() {
        Ok(v) if (0.0..=1.0).contains(&v) => v,
        _ => fail(format!("{} expects a ratio between 0 and 1, got '{}'", flag, raw)),
    }
}

fn account_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_else(|| "ACCOUNT".to_string())
}

fn cmd_settle(args: &[String]) {
    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut account = None;
    let mut config_path = None;
    let mut start = None;
    let mut end = None;
    let mut rate_url = None;
    let mut manual_rate = None;
    let mut offline = false;
    let mut liquidity_rate = None;
    let mut fee = None;
    let mut spread = None;
    let mut output_dir = None;
    let mut format = "text".to_string();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => inputs.push(PathBuf::from(value_of(args, &mut i, "--input"))),
            "--account" => account = Some(value_of(args, &mut i, "--account")),
            "--config" => config_path = Some(PathBuf::from(value_of(args, &mut i, "--config"))),
            "--start" => start = Some(date_of(args, &mut i, "--start")),
            "--end" => end = Some(date_of(args, &mut i, "--end")),
            "--rate-url" => rate_url = Some(value_of(args, &mut i, "--rate-url")),
            "--manual-rate" => manual_rate = Some(decimal_of(args, &mut i, "--manual-rate")),
            "--offline" => offline = true,
            "--liquidity-rate" => liquidity_rate = Some(decimal_of(args, &mut i, "--liquidity-rate")),
            "--fee" => fee = Some(decimal_of(args, &mut i, "--fee")),
            "--spread" => spread = Some(decimal_of(args, &mut i, "--spread")),
            "--output-dir" => output_dir = Some(PathBuf::from(value_of(args, &mut i, "--output-dir"))),
            "--format" => format = value_of(args, &mut i, "--format"),
            other => fail(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    if inputs.is_empty() {
        fail("--input <FILE> is required");
    }
    if format != "text" && format != "json" {
        fail("--format requires 'text' or 'json'");
    }

    let mut config = match &config_path {
        Some(path) => SettlementConfig::load(path).unwrap_or_else(|e| fail(e)),
        None => SettlementConfig::default(),
    };
    if let Some(url) = rate_url {
        config.rate.api_url = Some(url);
    }
    if offline {
        config.rate.api_url = None;
    }
    if let Some(rate) = manual_rate {
        config.rate.manual_fallback_rate = Some(rate);
    }
    if let Some(v) = liquidity_rate {
        config.formula.liquidity_rate = v;
    }
    if let Some(v) = fee {
        config.formula.operational_fee = v;
    }
    if let Some(v) = spread {
        config.formula.spread_factor = v;
    }
    if let Some(dir) = output_dir {
        config.report.output_dir = dir;
    }
    config.validate().unwrap_or_else(|e| fail(e));

    let period = match (start, end) {
        (Some(start), Some(end)) => {
            Some(SettlementPeriod::new(start, end).unwrap_or_else(|e| fail(e)))
        }
        (None, None) => None,
        _ => fail("--start and --end must be given together"),
    };

    let account = account.unwrap_or_else(|| account_from_path(&inputs[0]));
    let mut request = RunRequest::new(account);
    if let Some(period) = period {
        request = request.with_period(period);
    }

    let batch = CsvSource::read_batch(&inputs).unwrap_or_else(|e| fail(e));
    let pipeline = SettlementPipeline::from_config(&config);
    let outcome = pipeline.run(batch, &request).unwrap_or_else(|e| fail(e));

    if format == "json" {
        match serde_json::to_string_pretty(&outcome.report) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
    } else {
        println!("{}", outcome.report);
    }
    for path in &outcome.locations {
        eprintln!("Report saved at: {}", path.display());
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = LedgerConfig::default();
    let mut output_path: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--days" => {
                let raw = value_of(args, &mut i, "--days");
                config.days = raw
                    .parse()
                    .unwrap_or_else(|_| fail("--days requires a number"));
            }
            "--rows-per-day" => {
                let raw = value_of(args, &mut i, "--rows-per-day");
                config.rows_per_day = raw
                    .parse()
                    .unwrap_or_else(|_| fail("--rows-per-day requires a number"));
            }
            "--start" => config.start_date = date_of(args, &mut i, "--start"),
            "--bonus-ratio" => config.bonus_ratio = ratio_of(args, &mut i, "--bonus-ratio"),
            "--malformed-ratio" => {
                config.malformed_ratio = ratio_of(args, &mut i, "--malformed-ratio")
            }
            "--output" => output_path = Some(value_of(args, &mut i, "--output")),
            other => fail(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    let rows = generate_ledger(&config);

    if let Some(path) = output_path {
        let file = std::fs::File::create(&path)
            .unwrap_or_else(|e| fail(format!("cannot create '{}': {}", path, e)));
        write_csv(&rows, file).unwrap_or_else(|e| fail(e));
        eprintln!("Generated {} rows over {} days → {}", rows.len(), config.days, path);
    } else {
        write_csv(&rows, std::io::stdout().lock()).unwrap_or_else(|e| fail(e));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "settle" => cmd_settle(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
