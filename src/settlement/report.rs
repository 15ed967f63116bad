use crate::audit::period::SettlementPeriod;
use crate::core::rate::RateSource;
use crate::core::record::Denomination;
use crate::core::totals::DenominationTotals;
use crate::settlement::calculator::{FormulaParameters, SettlementResult};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors persisting a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("a report already exists at {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Row accounting for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub input_sources: usize,
    pub source_names: Vec<String>,
    pub input_rows: usize,
    pub accepted_rows: usize,
    pub rejected_rows: usize,
    pub rejected_by_reason: BTreeMap<String, usize>,
    /// Non-liquidable records removed by the audit filter.
    pub excluded_rows: usize,
    pub out_of_period_rows: usize,
}

/// The persisted artifact of a settlement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub run_id: Uuid,
    pub account_id: String,
    pub generated_at: DateTime<Utc>,
    pub period: Option<SettlementPeriod>,
    pub metadata: RunMetadata,
    pub totals: DenominationTotals,
    pub parameters: FormulaParameters,
    /// Why the official rate could not be fetched, when a fallback was used.
    pub rate_failure: Option<String>,
    pub result: SettlementResult,
}

impl SettlementReport {
    pub fn rate_source(&self) -> RateSource {
        self.result.rate_used.source()
    }

    /// File stem identifying this report: account plus generation second.
    pub fn key(&self) -> String {
        format!(
            "Settlement_{}_{}",
            sanitize(&self.account_id),
            self.generated_at.format("%Y%m%dT%H%M%SZ")
        )
    }
}

fn sanitize(account: &str) -> String {
    let cleaned: String = account
        .trim()
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "ACCOUNT".to_string()
    } else {
        cleaned
    }
}

/// Two-decimal rendering used throughout the text report.
pub fn format_money(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

const RULE: &str = "========================================";
const THIN_RULE: &str = "----------------------------------------";

impl fmt::Display for SettlementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.metadata;
        let r = &self.result;

        writeln!(f, "{}", RULE)?;
        writeln!(f, "       GLOBAL ASSETS SETTLEMENT")?;
        writeln!(f, "       ACCOUNT ID: {}", self.account_id.to_uppercase())?;
        match &self.period {
            Some(period) => writeln!(f, "       PERIOD: {}", period)?,
            None => writeln!(f, "       PERIOD: ALL DATES")?,
        }
        writeln!(f, "       GENERATED: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "       RUN: {}", self.run_id)?;
        writeln!(f, "{}\n", RULE)?;

        writeln!(f, "INPUT SOURCES:         {}", m.input_sources)?;
        writeln!(f, "ROWS READ:             {}", m.input_rows)?;
        writeln!(f, "ROWS REJECTED:         {}", m.rejected_rows)?;
        for (reason, count) in &m.rejected_by_reason {
            writeln!(f, "  {}: {}", reason, count)?;
        }
        writeln!(f, "NON-LIQUIDABLE:        {}", m.excluded_rows)?;
        writeln!(f, "OUTSIDE PERIOD:        {}", m.out_of_period_rows)?;
        writeln!(f, "RECORDS SETTLED:       {}\n", self.totals.record_count)?;

        for denomination in [Denomination::Micro, Denomination::Nominal] {
            let (unit, suffix) = match denomination {
                Denomination::Micro => ("PTS", "points"),
                Denomination::Nominal => ("$", "$"),
            };
            writeln!(f, ">>> PROVIDER: DIGITAL ASSETS {}", denomination.label())?;
            for day in self.totals.days_for(denomination) {
                writeln!(f, "{}\nDATE: {}", THIN_RULE, day.date)?;
                for line in &day.lines {
                    writeln!(
                        f,
                        "{} {}: {} units ---> Subtotal: {} {}",
                        line.value.normalize(),
                        unit,
                        line.count,
                        line.subtotal.normalize(),
                        suffix
                    )?;
                }
                writeln!(f, "DAY TOTAL: {} {} ({} tasks)", day.subtotal.normalize(), unit, day.entry_count())?;
            }
            let (total, count) = match denomination {
                Denomination::Micro => (self.totals.micro_total, self.totals.micro_count),
                Denomination::Nominal => (self.totals.nominal_total, self.totals.nominal_count),
            };
            writeln!(f, "\nTOTAL {}: {} {} ({} tasks)\n", denomination.label(), total.normalize(), unit, count)?;
        }

        writeln!(f, "{}", RULE)?;
        writeln!(f, "           FINANCIAL SUMMARY")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "RAW ASSETS TOTAL:      {} $", format_money(r.gross_equity))?;
        writeln!(f, "LIQUIDATED:            {} USDT", format_money(r.market_adjusted))?;
        writeln!(f, "NET SETTLEMENT:        {} USDT", format_money(r.net_settlement))?;
        writeln!(f, "MARKET RATE APPLIED:   {} VES/USDT", format_money(r.market_rate))?;
        writeln!(f, "{}", THIN_RULE)?;
        writeln!(
            f,
            "OPERATOR FEE ({}%):     {} VES ({} $ OFFICIAL)",
            (self.parameters.operational_fee * Decimal::ONE_HUNDRED).normalize(),
            format_money(r.fee_ves),
            format_money(r.fee_purchasing_power)
        )?;
        writeln!(
            f,
            "OWNER PAYOUT:          {} VES ({} $ OFFICIAL)",
            format_money(r.ves_amount),
            format_money(r.purchasing_power)
        )?;
        writeln!(
            f,
            "OFFICIAL RATE:         {} VES ({})",
            format_money(r.rate_used.value()),
            r.rate_used.source()
        )?;
        if let Some(reason) = &self.rate_failure {
            writeln!(f, "RATE FALLBACK REASON:  {}", reason)?;
        }
        writeln!(f, "{}", RULE)
    }
}

/// Destination for finished reports.
pub trait ReportSink {
    /// Persist the report in full or not at all. Returns where it went.
    fn persist(&self, report: &SettlementReport) -> Result<Vec<PathBuf>, ReportError>;
}

/// Writes `<key>.json` and `<key>.txt` into a directory.
///
/// Both files are staged under temporary names and then hard-linked into
/// place. Linking fails if the target exists, so an existing report with
/// the same key is never overwritten.
#[derive(Debug, Clone)]
pub struct FileReportSink {
    output_dir: PathBuf,
}

impl FileReportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError + '_ {
    move |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Link `staged` to `target` without ever replacing `target`.
fn publish(staged: &Path, target: &Path) -> Result<(), ReportError> {
    fs::hard_link(staged, target).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            ReportError::AlreadyExists(target.to_path_buf())
        } else {
            io_error(target)(e)
        }
    })
}

impl ReportSink for FileReportSink {
    fn persist(&self, report: &SettlementReport) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(&self.output_dir).map_err(io_error(&self.output_dir))?;

        let key = report.key();
        let json_path = self.output_dir.join(format!("{}.json", key));
        let text_path = self.output_dir.join(format!("{}.txt", key));
        let json_tmp = self.output_dir.join(format!(".{}.{}.json.tmp", key, report.run_id));
        let text_tmp = self.output_dir.join(format!(".{}.{}.txt.tmp", key, report.run_id));

        let json = serde_json::to_string_pretty(report)?;
        let text = report.to_string();

        let result = fs::write(&json_tmp, json)
            .map_err(io_error(&json_tmp))
            .and_then(|_| fs::write(&text_tmp, text).map_err(io_error(&text_tmp)))
            .and_then(|_| publish(&json_tmp, &json_path))
            .and_then(|_| {
                publish(&text_tmp, &text_path).map_err(|e| {
                    let _ = fs::remove_file(&json_path);
                    e
                })
            });
        let _ = fs::remove_file(&json_tmp);
        let _ = fs::remove_file(&text_tmp);
        result?;

        log::info!("report written to {}", json_path.display());
        Ok(vec![json_path, text_path])
    }
}
