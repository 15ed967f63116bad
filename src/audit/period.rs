use crate::core::record::AssetRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("settlement period starts {start} after it ends {end}")]
pub struct InvertedPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive range of calendar days a settlement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl SettlementPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvertedPeriod> {
        if start > end {
            return Err(InvertedPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Split records into those inside the period and a count of the rest.
    pub fn restrict(&self, records: Vec<AssetRecord>) -> (Vec<AssetRecord>, usize) {
        let before = records.len();
        let inside: Vec<AssetRecord> = records
            .into_iter()
            .filter(|r| self.contains(r.date()))
            .collect();
        let outside = before - inside.len();
        if outside > 0 {
            log::info!("{} records fall outside {}", outside, self);
        }
        (inside, outside)
    }
}

impl fmt::Display for SettlementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} TO {}", self.start, self.end)
    }
}
