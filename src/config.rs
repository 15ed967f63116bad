//! Run configuration.
//!
//! Every constant the pipeline uses can be set from a JSON file; keys that
//! are absent keep their audited defaults.
//!
//! ```json
//! {
//!   "formula": { "liquidity_rate": "0.75", "operational_fee": "0.10", "spread_factor": "1.824" },
//!   "rate": { "api_url": "https://rates.example/usd", "manual_fallback_rate": "36.50" },
//!   "audit": { "patterns": ["Punchcard"], "match_mode": "exact" },
//!   "classification": { "micro_platforms": ["Digital_Assets_Type_1"] },
//!   "report": { "output_dir": "history_reports" }
//! }
//! ```

use crate::audit::filter::AuditFilter;
use crate::ingest::classifier::Classifier;
use crate::rates::RateConfig;
use crate::settlement::calculator::{FormulaParameters, ParameterError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_OUTPUT_DIR: &str = "history_reports";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    #[error("invalid config: {0}")]
    Parse(String),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error("manual_fallback_rate must be positive, got {0}")]
    FallbackRate(Decimal),
    #[error("rate timeout must be at least one second")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Everything a settlement run can be tuned with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub formula: FormulaParameters,
    pub rate: RateConfig,
    pub audit: AuditFilter,
    pub classification: Classifier,
    pub report: ReportConfig,
}

impl SettlementConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_json(&content)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: SettlementConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.formula.validate()?;
        if let Some(rate) = self.rate.manual_fallback_rate {
            if rate <= Decimal::ZERO {
                return Err(ConfigError::FallbackRate(rate));
            }
        }
        if self.rate.timeout_secs == 0 {
            return Err(ConfigError::Timeout);
        }
        Ok(())
    }
}
