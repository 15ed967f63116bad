use crate::core::record::{AssetRecord, RawRecord};
use crate::ingest::classifier::Classifier;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Why a raw row did not become an [`AssetRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("amount is missing")]
    MissingAmount,
    #[error("amount '{0}' is not a number")]
    InvalidAmount(String),
    #[error("date is missing")]
    MissingDate,
    #[error("date '{0}' is not a recognized date")]
    InvalidDate(String),
    #[error("cannot tell the denomination of platform '{0}'")]
    UnknownDenomination(String),
}

impl RejectReason {
    /// Stable key for tallying reasons in a report.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MissingAmount => "missing_amount",
            RejectReason::InvalidAmount(_) => "invalid_amount",
            RejectReason::MissingDate => "missing_date",
            RejectReason::InvalidDate(_) => "invalid_date",
            RejectReason::UnknownDenomination(_) => "unknown_denomination",
        }
    }
}

/// A row that failed validation, with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub source: Option<String>,
    pub line: usize,
    pub reason: RejectReason,
}

/// Output of [`Normalizer::normalize`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<AssetRecord>,
    pub rejected: Vec<RejectedRow>,
}

impl Normalized {
    pub fn accepted_count(&self) -> usize {
        self.records.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Count of rejected rows per [`RejectReason::code`].
    pub fn reject_tally(&self) -> BTreeMap<String, usize> {
        let mut tally = BTreeMap::new();
        for row in &self.rejected {
            *tally.entry(row.reason.code().to_string()).or_insert(0) += 1;
        }
        tally
    }
}

/// Turns raw rows into validated records.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    classifier: Classifier,
}

impl Normalizer {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    /// Validate every row. Bad rows are collected, never fatal.
    pub fn normalize(&self, rows: impl IntoIterator<Item = RawRecord>) -> Normalized {
        let mut out = Normalized::default();
        for row in rows {
            let line = row.line;
            let source = row.source.clone();
            match self.normalize_row(row) {
                Ok(record) => out.records.push(record),
                Err(reason) => {
                    log::debug!(
                        "rejecting {}:{}: {}",
                        source.as_deref().unwrap_or("<unknown>"),
                        line,
                        reason
                    );
                    out.rejected.push(RejectedRow {
                        source,
                        line,
                        reason,
                    });
                }
            }
        }
        if !out.rejected.is_empty() {
            log::warn!(
                "{} of {} rows rejected during normalization",
                out.rejected.len(),
                out.rejected.len() + out.records.len()
            );
        }
        out
    }

    /// Validate a single row.
    pub fn normalize_row(&self, row: RawRecord) -> Result<AssetRecord, RejectReason> {
        let amount = match non_empty(row.amount.as_deref()) {
            Some(raw) => parse_amount(raw).ok_or_else(|| RejectReason::InvalidAmount(raw.into()))?,
            None => return Err(RejectReason::MissingAmount),
        };
        let date = match non_empty(row.date.as_deref()) {
            Some(raw) => parse_date(raw).ok_or_else(|| RejectReason::InvalidDate(raw.into()))?,
            None => return Err(RejectReason::MissingDate),
        };
        let platform = non_empty(row.platform.as_deref()).unwrap_or_default();
        let denomination = self
            .classifier
            .classify(Some(platform), non_empty(row.denomination.as_deref()))
            .ok_or_else(|| RejectReason::UnknownDenomination(platform.to_string()))?;

        Ok(AssetRecord::new(
            date,
            row.description.as_deref().map(str::trim).unwrap_or_default(),
            amount,
            platform,
            denomination,
        ))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a ledger amount. Tolerates a currency sign and thousands separators.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let cleaned: String = unsigned
        .strip_prefix('$')
        .unwrap_or(unsigned)
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() || cleaned.starts_with('-') {
        return None;
    }
    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()?;
    Some(if negative { -value } else { value })
}

/// Parse a ledger date, keeping only the calendar day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}
