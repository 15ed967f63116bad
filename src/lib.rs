//! # asset-settlement
//!
//! Audited settlement of multi-denomination asset ledgers into a single
//! local-currency report.
//!
//! Ledger rows are normalized into typed records, stripped of
//! non-liquidable bonus entries, summed per denomination, run through a
//! fixed market/fee/spread formula and converted at an official exchange
//! rate (with a manual fallback when the rate service is unavailable).
//!
//! ## Architecture
//!
//! - **core** — Foundational types: records, denomination totals, exchange rates, checked arithmetic
//! - **ingest** — CSV source, denomination classifier, record normalizer
//! - **audit** — Non-liquidable filter and settlement period
//! - **rates** — Rate feeds and the fallback-aware rate provider
//! - **settlement** — Formula chain, report, end-to-end pipeline
//! - **simulation** — Random ledger generation

pub mod audit;
pub mod config;
pub mod core;
pub mod ingest;
pub mod rates;
pub mod settlement;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::audit::filter::{AuditFilter, MatchMode};
    pub use crate::audit::period::SettlementPeriod;
    pub use crate::config::SettlementConfig;
    pub use crate::core::rate::{ExchangeRate, RateSource};
    pub use crate::core::record::{AssetRecord, Denomination, RawRecord};
    pub use crate::core::totals::{Aggregator, DenominationTotals};
    pub use crate::ingest::InputBatch;
    pub use crate::rates::provider::{RateAcquisition, RateProvider};
    pub use crate::settlement::calculator::{FormulaParameters, SettlementCalculator, SettlementResult};
    pub use crate::settlement::pipeline::{RunRequest, SettlementError, SettlementPipeline};
    pub use crate::settlement::report::{FileReportSink, ReportSink, SettlementReport};
}
