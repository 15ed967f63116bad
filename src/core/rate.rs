use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where an exchange rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateSource {
    /// Fetched from the official rate service.
    Api,
    /// Taken from run configuration after the service could not be used.
    ManualFallback,
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSource::Api => write!(f, "API"),
            RateSource::ManualFallback => write!(f, "MANUAL_FALLBACK"),
        }
    }
}

/// Errors arising from exchange rate acquisition.
///
/// All of these are recoverable: the rate provider answers them with the
/// configured manual rate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("no rate source configured")]
    NoSource,
    #[error("rate request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("rate request to {url} timed out")]
    Timeout { url: String },
    #[error("rate service answered HTTP {status}")]
    HttpStatus { status: u16 },
    #[error("malformed rate response: {0}")]
    Malformed(String),
    #[error("exchange rate must be positive, got {0}")]
    NonPositive(Decimal),
}

/// Local-currency units per unit of the reference currency.
///
/// The value is always strictly positive; a zero or negative rate cannot be
/// constructed.
///
/// # Examples
///
/// ```
/// use asset_settlement::core::rate::{ExchangeRate, RateSource};
/// use rust_decimal_macros::dec;
///
/// let rate = ExchangeRate::new(dec!(36.5), RateSource::Api).unwrap();
/// assert_eq!(rate.value(), dec!(36.5));
/// assert!(ExchangeRate::new(dec!(0), RateSource::Api).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredRate")]
pub struct ExchangeRate {
    value: Decimal,
    source: RateSource,
    fetched_at: DateTime<Utc>,
}

/// Wire form of [`ExchangeRate`], validated on the way in.
#[derive(Deserialize)]
struct StoredRate {
    value: Decimal,
    source: RateSource,
    fetched_at: DateTime<Utc>,
}

impl TryFrom<StoredRate> for ExchangeRate {
    type Error = RateError;

    fn try_from(stored: StoredRate) -> Result<Self, Self::Error> {
        ExchangeRate::at(stored.value, stored.source, stored.fetched_at)
    }
}

impl ExchangeRate {
    /// Create a rate stamped with the current time.
    pub fn new(value: Decimal, source: RateSource) -> Result<Self, RateError> {
        Self::at(value, source, Utc::now())
    }

    /// Create a rate with an explicit acquisition timestamp.
    pub fn at(
        value: Decimal,
        source: RateSource,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, RateError> {
        if value <= Decimal::ZERO {
            return Err(RateError::NonPositive(value));
        }
        Ok(Self {
            value,
            source,
            fetched_at,
        })
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn source(&self) -> RateSource {
        self.source
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::ManualFallback
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.value
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            self.source
        )
    }
}
