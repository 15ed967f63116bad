use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two asset denominations a ledger can hold.
///
/// `Micro` assets (TYPE_1, "points") are expressed in hundredths of the
/// nominal unit. `Nominal` assets (TYPE_2) are valued directly in the
/// reference currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denomination {
    Micro,
    Nominal,
}

impl Denomination {
    /// Parse an explicit denomination tag as found in an input column.
    ///
    /// Accepts `micro`, `type_1`, `type1`, `points` and `nominal`, `type_2`,
    /// `type2`, `usd`, case-insensitively. Anything else yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use asset_settlement::core::record::Denomination;
    ///
    /// assert_eq!(Denomination::from_tag("Points"), Some(Denomination::Micro));
    /// assert_eq!(Denomination::from_tag("TYPE_2"), Some(Denomination::Nominal));
    /// assert_eq!(Denomination::from_tag("gift"), None);
    /// ```
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "micro" | "type_1" | "type1" | "points" => Some(Denomination::Micro),
            "nominal" | "type_2" | "type2" | "usd" => Some(Denomination::Nominal),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Denomination::Micro => "TYPE 1 (POINTS)",
            Denomination::Nominal => "TYPE 2 (DIRECT USD)",
        }
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denomination::Micro => write!(f, "micro"),
            Denomination::Nominal => write!(f, "nominal"),
        }
    }
}

/// One row exactly as the ingestion source produced it.
///
/// Every field is optional text; validation happens in the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// 1-based position of the row in its source, header excluded.
    #[serde(default)]
    pub line: usize,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub denomination: Option<String>,
    /// Name of the file or stream the row came from.
    #[serde(default)]
    pub source: Option<String>,
}

impl RawRecord {
    /// Build a raw row from the four mandatory columns.
    pub fn new(
        line: usize,
        date: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            line,
            date: Some(date.into()),
            description: Some(description.into()),
            amount: Some(amount.into()),
            platform: Some(platform.into()),
            denomination: None,
            source: None,
        }
    }

    /// Record which source the row was read from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach an explicit denomination tag.
    pub fn with_denomination(mut self, tag: impl Into<String>) -> Self {
        self.denomination = Some(tag.into());
        self
    }
}

/// A validated ledger entry.
///
/// Created by the normalizer from one raw row and immutable afterwards.
///
/// # Examples
///
/// ```
/// use asset_settlement::core::record::{AssetRecord, Denomination};
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let record = AssetRecord::new(
///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     "Survey completed",
///     dec!(250),
///     "Digital_Assets_Type_1",
///     Denomination::Micro,
/// );
/// assert_eq!(record.amount(), dec!(250));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    date: NaiveDate,
    description: String,
    amount: Decimal,
    platform: String,
    denomination: Denomination,
}

impl AssetRecord {
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        amount: Decimal,
        platform: impl Into<String>,
        denomination: Denomination,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
            platform: platform.into(),
            denomination,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn denomination(&self) -> Denomination {
        self.denomination
    }
}
