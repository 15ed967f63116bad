//! Random ledger generation.
//!
//! Produces realistic-looking raw ledgers, including bonus entries and
//! malformed rows, for benchmarks, property tests and demo data.

use crate::audit::filter::DEFAULT_NON_LIQUIDABLE;
use crate::core::record::RawRecord;
use crate::ingest::classifier::{DEFAULT_MICRO_PLATFORM, DEFAULT_NOMINAL_PLATFORM};
use chrono::{Days, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use std::io::Write;

const TASK_DESCRIPTIONS: &[&str] = &[
    "Survey Completed",
    "Daily Task",
    "Profile Survey",
    "Product Review",
];

/// Configuration for generating a random ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub start_date: NaiveDate,
    /// Number of consecutive days covered.
    pub days: u64,
    pub rows_per_day: usize,
    /// Face values drawn for micro (points) rows.
    pub micro_values: Vec<Decimal>,
    /// Face values drawn for nominal rows.
    pub nominal_values: Vec<Decimal>,
    /// Probability that a row is a non-liquidable bonus.
    pub bonus_ratio: f64,
    /// Probability that a row carries an unparsable amount.
    pub malformed_ratio: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            days: 14,
            rows_per_day: 8,
            micro_values: [20, 50, 75, 100, 150, 300]
                .into_iter()
                .map(Decimal::from)
                .collect(),
            nominal_values: ["0.50", "1", "1.50", "2", "5"]
                .iter()
                .filter_map(|v| v.parse().ok())
                .collect(),
            bonus_ratio: 0.05,
            malformed_ratio: 0.0,
        }
    }
}

/// Generate a random raw ledger.
pub fn generate_ledger(config: &LedgerConfig) -> Vec<RawRecord> {
    let mut rng = rand::thread_rng();
    let mut rows = Vec::new();

    for offset in 0..config.days {
        let Some(date) = config.start_date.checked_add_days(Days::new(offset)) else {
            break;
        };
        for _ in 0..config.rows_per_day {
            let micro = rng.gen_bool(0.5);
            let (platform, values) = if micro {
                (DEFAULT_MICRO_PLATFORM, &config.micro_values)
            } else {
                (DEFAULT_NOMINAL_PLATFORM, &config.nominal_values)
            };
            let Some(value) = values.choose(&mut rng) else {
                continue;
            };

            let pool = if rng.gen_bool(config.bonus_ratio.clamp(0.0, 1.0)) {
                DEFAULT_NON_LIQUIDABLE
            } else {
                TASK_DESCRIPTIONS
            };
            let description = pool.choose(&mut rng).copied().unwrap_or("Task");

            let amount = if rng.gen_bool(config.malformed_ratio.clamp(0.0, 1.0)) {
                "pending".to_string()
            } else {
                value.to_string()
            };

            rows.push(RawRecord::new(
                rows.len() + 1,
                date.format("%Y-%m-%d").to_string(),
                description,
                amount,
                platform,
            ));
        }
    }

    rows
}

/// Write rows as CSV with the standard ledger header.
pub fn write_csv<W: Write>(rows: &[RawRecord], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["date", "description", "amount", "platform"])?;
    for row in rows {
        out.write_record([
            row.date.as_deref().unwrap_or_default(),
            row.description.as_deref().unwrap_or_default(),
            row.amount.as_deref().unwrap_or_default(),
            row.platform.as_deref().unwrap_or_default(),
        ])?;
    }
    out.flush()?;
    Ok(())
}
