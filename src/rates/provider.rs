use crate::core::rate::{ExchangeRate, RateError, RateSource};
use crate::rates::feed::RateFeed;
use rust_decimal::Decimal;
use thiserror::Error;

/// How the rate for a run was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum RateAcquisition {
    /// The feed answered with a valid rate.
    Acquired(ExchangeRate),
    /// The feed failed; the configured manual rate is used instead.
    Fallback {
        rate: ExchangeRate,
        reason: RateError,
    },
}

impl RateAcquisition {
    pub fn rate(&self) -> &ExchangeRate {
        match self {
            RateAcquisition::Acquired(rate) => rate,
            RateAcquisition::Fallback { rate, .. } => rate,
        }
    }

    pub fn into_rate(self) -> ExchangeRate {
        match self {
            RateAcquisition::Acquired(rate) => rate,
            RateAcquisition::Fallback { rate, .. } => rate,
        }
    }

    /// Why the feed could not be used, if it could not.
    pub fn failure(&self) -> Option<&RateError> {
        match self {
            RateAcquisition::Acquired(_) => None,
            RateAcquisition::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// Neither the feed nor the manual configuration produced a usable rate.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no exchange rate available: {reason}")]
pub struct RateUnavailable {
    pub reason: String,
}

/// Acquires the official rate, falling back to a manual value.
///
/// Feed failures are always absorbed when a positive manual rate is
/// configured. Only the absence of both is an error.
pub struct RateProvider {
    feed: Option<Box<dyn RateFeed>>,
    manual_fallback: Option<Decimal>,
}

impl RateProvider {
    pub fn new(feed: Option<Box<dyn RateFeed>>, manual_fallback: Option<Decimal>) -> Self {
        Self {
            feed,
            manual_fallback,
        }
    }

    /// A provider that never queries a feed.
    pub fn manual(rate: Decimal) -> Self {
        Self::new(None, Some(rate))
    }

    pub fn with_feed(feed: impl RateFeed + 'static, manual_fallback: Option<Decimal>) -> Self {
        Self::new(Some(Box::new(feed)), manual_fallback)
    }

    /// Query the feed, then fall back if needed.
    ///
    /// # Examples
    ///
    /// ```
    /// use asset_settlement::core::rate::RateSource;
    /// use asset_settlement::rates::provider::RateProvider;
    /// use rust_decimal_macros::dec;
    ///
    /// let provider = RateProvider::manual(dec!(40));
    /// let acquisition = provider.acquire().unwrap();
    /// assert_eq!(acquisition.rate().source(), RateSource::ManualFallback);
    /// assert_eq!(acquisition.rate().value(), dec!(40));
    /// ```
    pub fn acquire(&self) -> Result<RateAcquisition, RateUnavailable> {
        let failure = match &self.feed {
            Some(feed) => match feed.fetch().and_then(|v| ExchangeRate::new(v, RateSource::Api)) {
                Ok(rate) => {
                    log::info!("official rate {} from {}", rate.value(), feed.name());
                    return Ok(RateAcquisition::Acquired(rate));
                }
                Err(e) => {
                    log::warn!("rate feed {} failed: {}", feed.name(), e);
                    e
                }
            },
            None => RateError::NoSource,
        };

        let manual = self.manual_fallback.ok_or_else(|| RateUnavailable {
            reason: format!("{}; no manual fallback rate configured", failure),
        })?;
        let rate = ExchangeRate::new(manual, RateSource::ManualFallback).map_err(|e| {
            RateUnavailable {
                reason: format!("{}; manual fallback unusable: {}", failure, e),
            }
        })?;

        log::warn!("using manual fallback rate {}", rate.value());
        Ok(RateAcquisition::Fallback {
            rate,
            reason: failure,
        })
    }
}
