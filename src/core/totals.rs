use crate::core::arith::{self, Overflow};
use crate::core::record::{AssetRecord, Denomination};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of entries sharing one face value on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: Decimal,
    pub count: usize,
    /// `value * count`, in the denomination's own unit.
    pub subtotal: Decimal,
}

/// All entries of one denomination on one calendar day, grouped by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub denomination: Denomination,
    /// Sorted by ascending value.
    pub lines: Vec<ValueCount>,
    pub subtotal: Decimal,
}

impl DailyBreakdown {
    pub fn entry_count(&self) -> usize {
        self.lines.iter().map(|l| l.count).sum()
    }
}

/// Per-denomination sums of a filtered record set.
///
/// `micro_total` is kept in micro units; the conversion to nominal units is
/// a separate stage of the settlement formula.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenominationTotals {
    pub micro_total: Decimal,
    pub nominal_total: Decimal,
    /// Number of records that contributed to either total.
    pub record_count: usize,
    pub micro_count: usize,
    pub nominal_count: usize,
    /// Sorted by date, then denomination.
    pub breakdown: Vec<DailyBreakdown>,
}

impl DenominationTotals {
    /// Totals without a per-day breakdown, e.g. when replaying a past run.
    pub fn new(micro_total: Decimal, nominal_total: Decimal, record_count: usize) -> Self {
        Self {
            micro_total,
            nominal_total,
            record_count,
            ..Default::default()
        }
    }

    pub fn total_for(&self, denomination: Denomination) -> Decimal {
        match denomination {
            Denomination::Micro => self.micro_total,
            Denomination::Nominal => self.nominal_total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Breakdown entries for a single denomination, in date order.
    pub fn days_for(&self, denomination: Denomination) -> impl Iterator<Item = &DailyBreakdown> {
        self.breakdown
            .iter()
            .filter(move |d| d.denomination == denomination)
    }
}

/// Sums filtered records into [`DenominationTotals`].
pub struct Aggregator;

impl Aggregator {
    /// Partition `records` by denomination and sum each partition exactly.
    ///
    /// Fails only if a sum leaves the range of `Decimal`.
    ///
    /// # Examples
    ///
    /// ```
    /// use asset_settlement::core::record::{AssetRecord, Denomination};
    /// use asset_settlement::core::totals::Aggregator;
    /// use chrono::NaiveDate;
    /// use rust_decimal_macros::dec;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
    /// let records = vec![
    ///     AssetRecord::new(day, "a", dec!(25000), "P1", Denomination::Micro),
    ///     AssetRecord::new(day, "b", dec!(300), "P2", Denomination::Nominal),
    /// ];
    /// let totals = Aggregator::aggregate(&records).unwrap();
    /// assert_eq!(totals.micro_total, dec!(25000));
    /// assert_eq!(totals.nominal_total, dec!(300));
    /// ```
    pub fn aggregate(records: &[AssetRecord]) -> Result<DenominationTotals, Overflow> {
        let mut totals = DenominationTotals::default();
        let mut days: BTreeMap<(NaiveDate, Denomination), BTreeMap<Decimal, usize>> =
            BTreeMap::new();

        for record in records {
            match record.denomination() {
                Denomination::Micro => {
                    totals.micro_total =
                        arith::add(totals.micro_total, record.amount(), "micro total")?;
                    totals.micro_count += 1;
                }
                Denomination::Nominal => {
                    totals.nominal_total =
                        arith::add(totals.nominal_total, record.amount(), "nominal total")?;
                    totals.nominal_count += 1;
                }
            }
            totals.record_count += 1;

            *days
                .entry((record.date(), record.denomination()))
                .or_default()
                .entry(record.amount())
                .or_insert(0) += 1;
        }

        for ((date, denomination), values) in days {
            let mut lines = Vec::with_capacity(values.len());
            let mut subtotal = Decimal::ZERO;
            for (value, count) in values {
                let line_total = arith::mul(value, Decimal::from(count), "daily subtotal")?;
                subtotal = arith::add(subtotal, line_total, "daily subtotal")?;
                lines.push(ValueCount {
                    value,
                    count,
                    subtotal: line_total,
                });
            }
            totals.breakdown.push(DailyBreakdown {
                date,
                denomination,
                lines,
                subtotal,
            });
        }

        log::debug!(
            "aggregated {} records: micro={} nominal={}",
            totals.record_count,
            totals.micro_total,
            totals.nominal_total
        );
        Ok(totals)
    }
}
