use crate::core::record::AssetRecord;
use serde::{Deserialize, Serialize};

/// Descriptions of internal bonuses that carry no convertible value.
pub const DEFAULT_NON_LIQUIDABLE: &[&str] =
    &["Punchcard", "Weekly Badge Bonus", "Bonus Welcome Survey"];

/// How a description is compared against the pattern list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Trimmed description equals a pattern.
    #[default]
    Exact,
    /// Description contains a pattern.
    Substring,
}

/// Configured patterns marking a record as non-liquidable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditFilter {
    pub patterns: Vec<String>,
    pub match_mode: MatchMode,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_NON_LIQUIDABLE.iter().map(|p| p.to_string()).collect(),
            match_mode: MatchMode::Exact,
        }
    }
}

/// Records that survived the audit, and how many were dropped.
#[derive(Debug, Clone, Default)]
pub struct AuditOutcome {
    pub kept: Vec<AssetRecord>,
    pub excluded: usize,
}

impl AuditFilter {
    pub fn new(patterns: Vec<String>, match_mode: MatchMode) -> Self {
        Self {
            patterns,
            match_mode,
        }
    }

    /// The audit flag: does this description denote a non-liquidable entry?
    pub fn is_non_liquidable(&self, description: &str) -> bool {
        let description = description.trim();
        match self.match_mode {
            MatchMode::Exact => self.patterns.iter().any(|p| p == description),
            MatchMode::Substring => self
                .patterns
                .iter()
                .filter(|p| !p.is_empty())
                .any(|p| description.contains(p.as_str())),
        }
    }

    /// Drop every flagged record, preserving the order of the rest.
    ///
    /// # Examples
    ///
    /// ```
    /// use asset_settlement::audit::filter::AuditFilter;
    /// use asset_settlement::core::record::{AssetRecord, Denomination};
    /// use chrono::NaiveDate;
    /// use rust_decimal_macros::dec;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let records = vec![
    ///     AssetRecord::new(day, "Punchcard", dec!(500), "P1", Denomination::Micro),
    ///     AssetRecord::new(day, "Survey", dec!(120), "P1", Denomination::Micro),
    /// ];
    /// let outcome = AuditFilter::default().apply(records);
    /// assert_eq!(outcome.kept.len(), 1);
    /// assert_eq!(outcome.excluded, 1);
    /// ```
    pub fn apply(&self, records: Vec<AssetRecord>) -> AuditOutcome {
        let before = records.len();
        let kept: Vec<AssetRecord> = records
            .into_iter()
            .filter(|r| !self.is_non_liquidable(r.description()))
            .collect();
        let excluded = before - kept.len();
        if excluded > 0 {
            log::info!("audit excluded {} non-liquidable records", excluded);
        }
        AuditOutcome { kept, excluded }
    }
}
