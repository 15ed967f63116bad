//! Exchange rate acquisition.
//!
//! A [`feed::RateFeed`] performs the external query; the
//! [`provider::RateProvider`] turns its outcome into a
//! [`provider::RateAcquisition`], falling back to a manual rate on failure.

pub mod feed;
pub mod provider;

use feed::{HttpRateFeed, DEFAULT_TIMEOUT};
use provider::RateProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rate acquisition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    /// JSON endpoint of the official rate. `None` skips the query.
    pub api_url: Option<String>,
    /// Field of the response body holding the rate.
    pub response_field: String,
    pub timeout_secs: u64,
    /// Rate used whenever the endpoint cannot provide one.
    pub manual_fallback_rate: Option<Decimal>,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            response_field: "rate".to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            manual_fallback_rate: None,
        }
    }
}

impl RateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build a provider querying `api_url` over HTTP, if one is set.
    pub fn provider(&self) -> RateProvider {
        let feed = self.api_url.as_ref().map(|url| {
            Box::new(HttpRateFeed::new(
                url.clone(),
                self.response_field.clone(),
                self.timeout(),
            )) as Box<dyn feed::RateFeed>
        });
        RateProvider::new(feed, self.manual_fallback_rate)
    }
}
