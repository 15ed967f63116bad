use crate::core::arith::{self, Overflow};
use crate::core::rate::ExchangeRate;
use crate::core::totals::DenominationTotals;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A formula parameter outside its meaningful range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("liquidity_rate must be in (0, 1], got {0}")]
    LiquidityRate(Decimal),
    #[error("operational_fee must be in [0, 1), got {0}")]
    OperationalFee(Decimal),
    #[error("spread_factor must be positive, got {0}")]
    SpreadFactor(Decimal),
    #[error("micro_units_per_nominal must be positive, got {0}")]
    MicroUnits(Decimal),
}

/// Tunable constants of the settlement formula.
///
/// The defaults are the audited values; each one can be overridden
/// independently through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaParameters {
    /// Fraction of gross equity recoverable on the secondary market.
    pub liquidity_rate: Decimal,
    /// Fraction deducted as the operator's fee.
    pub operational_fee: Decimal,
    /// Multiplier from the official rate to the observed market rate.
    pub spread_factor: Decimal,
    /// Micro units making up one nominal unit.
    pub micro_units_per_nominal: Decimal,
}

impl Default for FormulaParameters {
    fn default() -> Self {
        Self {
            liquidity_rate: dec!(0.75),
            operational_fee: dec!(0.10),
            spread_factor: dec!(1.824),
            micro_units_per_nominal: dec!(100),
        }
    }
}

impl FormulaParameters {
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.liquidity_rate <= Decimal::ZERO || self.liquidity_rate > Decimal::ONE {
            return Err(ParameterError::LiquidityRate(self.liquidity_rate));
        }
        if self.operational_fee < Decimal::ZERO || self.operational_fee >= Decimal::ONE {
            return Err(ParameterError::OperationalFee(self.operational_fee));
        }
        if self.spread_factor <= Decimal::ZERO {
            return Err(ParameterError::SpreadFactor(self.spread_factor));
        }
        if self.micro_units_per_nominal <= Decimal::ZERO {
            return Err(ParameterError::MicroUnits(self.micro_units_per_nominal));
        }
        Ok(())
    }
}

// --- Formula stages, in order ---
//
// Each stage fails with `Overflow` rather than panicking when its result
// does not fit in a `Decimal`.

/// Stage 1: micro units normalized to nominal, plus the nominal total.
pub fn gross_equity(
    micro_total: Decimal,
    nominal_total: Decimal,
    micro_units: Decimal,
) -> Result<Decimal, Overflow> {
    let normalized = arith::div(micro_total, micro_units, "gross equity")?;
    arith::add(normalized, nominal_total, "gross equity")
}

/// Stage 2: value achievable on the secondary market.
pub fn market_adjusted(gross_equity: Decimal, liquidity_rate: Decimal) -> Result<Decimal, Overflow> {
    arith::mul(gross_equity, liquidity_rate, "market adjusted value")
}

/// Stage 3: what remains after the operational fee.
pub fn net_settlement(market_adjusted: Decimal, operational_fee: Decimal) -> Result<Decimal, Overflow> {
    let kept = arith::add(Decimal::ONE, -operational_fee, "net settlement")?;
    arith::mul(market_adjusted, kept, "net settlement")
}

/// The official rate corrected by the spread factor.
pub fn market_rate(official_rate: Decimal, spread_factor: Decimal) -> Result<Decimal, Overflow> {
    arith::mul(official_rate, spread_factor, "market rate")
}

/// Stage 4: net settlement converted at the spread-adjusted rate.
///
/// The spread multiplies the rate, never the converted amount.
pub fn local_amount(
    net_settlement: Decimal,
    official_rate: Decimal,
    spread_factor: Decimal,
) -> Result<Decimal, Overflow> {
    let rate = market_rate(official_rate, spread_factor)?;
    arith::mul(net_settlement, rate, "local amount")
}

/// Stage 5: the local amount re-expressed at the official rate.
pub fn purchasing_power(local_amount: Decimal, official_rate: Decimal) -> Result<Decimal, Overflow> {
    arith::div(local_amount, official_rate, "purchasing power")
}

/// Every figure of one settlement, at full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub gross_equity: Decimal,
    pub market_adjusted: Decimal,
    pub net_settlement: Decimal,
    /// Net settlement in local currency.
    pub ves_amount: Decimal,
    pub purchasing_power: Decimal,
    /// Official rate times spread factor.
    pub market_rate: Decimal,
    /// Operator's share deducted in stage 3.
    pub fee_amount: Decimal,
    pub fee_ves: Decimal,
    pub fee_purchasing_power: Decimal,
    pub rate_used: ExchangeRate,
    pub computed_at: DateTime<Utc>,
}

/// Runs the settlement formula.
pub struct SettlementCalculator;

impl SettlementCalculator {
    /// Compute a settlement stamped with the current time.
    pub fn compute(
        totals: &DenominationTotals,
        rate: ExchangeRate,
        params: &FormulaParameters,
    ) -> Result<SettlementResult, Overflow> {
        Self::compute_at(totals, rate, params, Utc::now())
    }

    /// Compute a settlement with an explicit timestamp. Pure.
    ///
    /// # Examples
    ///
    /// ```
    /// use asset_settlement::core::rate::{ExchangeRate, RateSource};
    /// use asset_settlement::core::totals::DenominationTotals;
    /// use asset_settlement::settlement::calculator::{FormulaParameters, SettlementCalculator};
    /// use chrono::Utc;
    /// use rust_decimal_macros::dec;
    ///
    /// let totals = DenominationTotals::new(dec!(0), dec!(1000), 1);
    /// let rate = ExchangeRate::new(dec!(40), RateSource::Api).unwrap();
    /// let result = SettlementCalculator::compute_at(
    ///     &totals,
    ///     rate,
    ///     &FormulaParameters::default(),
    ///     Utc::now(),
    /// )
    /// .unwrap();
    /// assert_eq!(result.net_settlement, dec!(675));
    /// assert_eq!(result.ves_amount, dec!(49248));
    /// ```
    pub fn compute_at(
        totals: &DenominationTotals,
        rate: ExchangeRate,
        params: &FormulaParameters,
        computed_at: DateTime<Utc>,
    ) -> Result<SettlementResult, Overflow> {
        let official = rate.value();

        let gross = gross_equity(
            totals.micro_total,
            totals.nominal_total,
            params.micro_units_per_nominal,
        )?;
        let adjusted = market_adjusted(gross, params.liquidity_rate)?;
        let net = net_settlement(adjusted, params.operational_fee)?;
        let ves = local_amount(net, official, params.spread_factor)?;
        let power = purchasing_power(ves, official)?;

        let fee_amount = arith::mul(adjusted, params.operational_fee, "fee amount")?;
        let fee_ves = local_amount(fee_amount, official, params.spread_factor)?;

        Ok(SettlementResult {
            gross_equity: gross,
            market_adjusted: adjusted,
            net_settlement: net,
            ves_amount: ves,
            purchasing_power: power,
            market_rate: market_rate(official, params.spread_factor)?,
            fee_amount,
            fee_ves,
            fee_purchasing_power: purchasing_power(fee_ves, official)?,
            rate_used: rate,
            computed_at,
        })
    }
}
