use crate::audit::filter::AuditFilter;
use crate::audit::period::SettlementPeriod;
use crate::config::SettlementConfig;
use crate::core::arith::Overflow;
use crate::core::totals::Aggregator;
use crate::ingest::normalizer::Normalizer;
use crate::ingest::InputBatch;
use crate::rates::provider::{RateProvider, RateUnavailable};
use crate::settlement::calculator::{FormulaParameters, ParameterError, SettlementCalculator};
use crate::settlement::report::{
    FileReportSink, ReportError, ReportSink, RunMetadata, SettlementReport,
};
use chrono::{SubsecRound, Utc};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Conditions that abort a run. Nothing is persisted when one occurs.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("configuration missing: {reason}")]
    ConfigurationMissing { reason: String },
    #[error("invalid formula parameters: {0}")]
    InvalidParameters(#[from] ParameterError),
    #[error("settlement figures out of range: {0}")]
    Overflow(#[from] Overflow),
    #[error("report persistence failed: {0}")]
    PersistenceFailed(#[from] ReportError),
}

impl From<RateUnavailable> for SettlementError {
    fn from(err: RateUnavailable) -> Self {
        SettlementError::ConfigurationMissing { reason: err.reason }
    }
}

/// Who and what period a run settles.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub account_id: String,
    pub period: Option<SettlementPeriod>,
}

impl RunRequest {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            period: None,
        }
    }

    pub fn with_period(mut self, period: SettlementPeriod) -> Self {
        self.period = Some(period);
        self
    }
}

/// A completed run: the report and where the sink put it.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub report: SettlementReport,
    pub locations: Vec<PathBuf>,
}

/// Normalize, audit, aggregate, price, compute and persist, in that order.
pub struct SettlementPipeline {
    normalizer: Normalizer,
    audit: AuditFilter,
    parameters: FormulaParameters,
    provider: RateProvider,
    sink: Box<dyn ReportSink>,
}

impl SettlementPipeline {
    pub fn new(
        config: &SettlementConfig,
        provider: RateProvider,
        sink: impl ReportSink + 'static,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(config.classification.clone()),
            audit: config.audit.clone(),
            parameters: config.formula.clone(),
            provider,
            sink: Box::new(sink),
        }
    }

    /// Pipeline with the HTTP rate feed and file sink described by `config`.
    pub fn from_config(config: &SettlementConfig) -> Self {
        Self::new(
            config,
            config.rate.provider(),
            FileReportSink::new(config.report.output_dir.clone()),
        )
    }

    /// Settle one batch.
    pub fn run(
        &self,
        batch: InputBatch,
        request: &RunRequest,
    ) -> Result<SettlementOutcome, SettlementError> {
        self.parameters.validate()?;

        let input_sources = batch.source_count();
        let source_names = batch.sources().to_vec();
        let input_rows = batch.row_count();

        let normalized = self.normalizer.normalize(batch.into_rows());
        let rejected_by_reason = normalized.reject_tally();
        let rejected_rows = normalized.rejected_count();
        let accepted_rows = normalized.accepted_count();

        let audited = self.audit.apply(normalized.records);
        let (records, out_of_period_rows) = match &request.period {
            Some(period) => period.restrict(audited.kept),
            None => (audited.kept, 0),
        };

        let totals = Aggregator::aggregate(&records)?;
        log::info!(
            "{}: {} rows, {} rejected, {} non-liquidable, {} settled",
            request.account_id,
            input_rows,
            rejected_rows,
            audited.excluded,
            totals.record_count
        );

        let acquisition = self.provider.acquire()?;
        let rate_failure = acquisition.failure().map(|e| e.to_string());
        let result =
            SettlementCalculator::compute(&totals, acquisition.into_rate(), &self.parameters)?;

        let report = SettlementReport {
            run_id: Uuid::new_v4(),
            account_id: request.account_id.clone(),
            generated_at: Utc::now().trunc_subsecs(0),
            period: request.period,
            metadata: RunMetadata {
                input_sources,
                source_names,
                input_rows,
                accepted_rows,
                rejected_rows,
                rejected_by_reason,
                excluded_rows: audited.excluded,
                out_of_period_rows,
            },
            totals,
            parameters: self.parameters.clone(),
            rate_failure,
            result,
        };

        let locations = self.sink.persist(&report)?;
        Ok(SettlementOutcome { report, locations })
    }
}
