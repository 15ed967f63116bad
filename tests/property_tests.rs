use approx::assert_relative_eq;
use asset_settlement::audit::filter::{AuditFilter, MatchMode};
use asset_settlement::core::rate::{ExchangeRate, RateSource};
use asset_settlement::core::record::{AssetRecord, Denomination, RawRecord};
use asset_settlement::core::totals::{Aggregator, DenominationTotals};
use asset_settlement::ingest::normalizer::Normalizer;
use asset_settlement::settlement::calculator::{FormulaParameters, SettlementCalculator};
use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// A positive amount with up to two decimals (0.01 to 100,000.00).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// A positive exchange rate with up to four decimals (0.0001 to 1,000.0000).
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn arb_denomination() -> impl Strategy<Value = Denomination> {
    prop_oneof![Just(Denomination::Micro), Just(Denomination::Nominal)]
}

/// Descriptions drawn from a small pool so bonus entries show up often.
fn arb_description() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "Punchcard",
        "Weekly Badge Bonus",
        "Bonus Welcome Survey",
        "Survey Completed",
        "Daily Task",
        "Bonus Round",
    ])
    .prop_map(String::from)
}

fn arb_record() -> impl Strategy<Value = AssetRecord> {
    (0u32..28, arb_description(), arb_amount(), arb_denomination()).prop_map(
        |(day, description, amount, denomination)| {
            AssetRecord::new(
                NaiveDate::from_ymd_opt(2024, 2, day + 1).unwrap(),
                description,
                amount,
                "platform",
                denomination,
            )
        },
    )
}

fn arb_totals() -> impl Strategy<Value = DenominationTotals> {
    (arb_amount(), arb_amount(), 0usize..500)
        .prop_map(|(micro, nominal, count)| DenominationTotals::new(micro, nominal, count))
}

/// A raw row whose amount is either valid or junk.
fn arb_raw_row() -> impl Strategy<Value = (RawRecord, Option<Decimal>)> {
    (
        arb_amount(),
        prop::bool::ANY,
        prop::sample::select(vec!["n/a", "", "ten", "1.2.3", "$"]),
    )
        .prop_map(|(amount, valid, junk)| {
            let text = if valid { amount.to_string() } else { junk.to_string() };
            let row = RawRecord::new(0, "2024-02-01", "Daily Task", text, "Digital_Assets_Type_2");
            (row, if valid { Some(amount) } else { None })
        })
}

proptest! {
    // ===================================================================
    // The formula is deterministic: identical inputs give identical results.
    // ===================================================================
    #[test]
    fn compute_is_deterministic(totals in arb_totals(), rate in arb_rate()) {
        let rate = ExchangeRate::new(rate, RateSource::Api).unwrap();
        let params = FormulaParameters::default();
        let at = Utc::now();
        let a = SettlementCalculator::compute_at(&totals, rate.clone(), &params, at).unwrap();
        let b = SettlementCalculator::compute_at(&totals, rate, &params, at).unwrap();
        prop_assert_eq!(a, b);
    }

    // ===================================================================
    // Stages 2 and 3 are exact multiplications by 0.75 and 0.90.
    // ===================================================================
    #[test]
    fn market_and_fee_stages_are_exact(totals in arb_totals(), rate in arb_rate()) {
        let rate = ExchangeRate::new(rate, RateSource::Api).unwrap();
        let r = SettlementCalculator::compute(&totals, rate, &FormulaParameters::default()).unwrap();
        prop_assert_eq!(r.market_adjusted, r.gross_equity * Decimal::new(75, 2));
        prop_assert_eq!(r.net_settlement, r.market_adjusted * Decimal::new(90, 2));
        prop_assert_eq!(r.fee_amount + r.net_settlement, r.market_adjusted);
    }

    // ===================================================================
    // Purchasing power re-derives the local amount within rounding.
    // ===================================================================
    #[test]
    fn purchasing_power_round_trip(totals in arb_totals(), rate in arb_rate()) {
        let official = ExchangeRate::new(rate, RateSource::Api).unwrap();
        let r = SettlementCalculator::compute(&totals, official, &FormulaParameters::default()).unwrap();
        let rederived = (r.purchasing_power * rate).to_f64().unwrap();
        let ves = r.ves_amount.to_f64().unwrap();
        assert_relative_eq!(rederived, ves, max_relative = 1e-12);
    }

    // ===================================================================
    // Purchasing power is the net settlement scaled by the spread factor.
    // ===================================================================
    #[test]
    fn purchasing_power_scales_by_spread(totals in arb_totals(), rate in arb_rate()) {
        let official = ExchangeRate::new(rate, RateSource::Api).unwrap();
        let params = FormulaParameters::default();
        let r = SettlementCalculator::compute(&totals, official, &params).unwrap();
        let expected = (r.net_settlement * params.spread_factor).to_f64().unwrap();
        assert_relative_eq!(r.purchasing_power.to_f64().unwrap(), expected, max_relative = 1e-12);
    }

    // ===================================================================
    // Filtering twice with the same patterns removes nothing more.
    // ===================================================================
    #[test]
    fn audit_filter_is_idempotent(
        records in prop::collection::vec(arb_record(), 0..60),
        substring in prop::bool::ANY,
    ) {
        let mode = if substring { MatchMode::Substring } else { MatchMode::Exact };
        let filter = AuditFilter {
            match_mode: mode,
            ..AuditFilter::default()
        };
        let once = filter.apply(records.clone());
        let twice = filter.apply(once.kept.clone());
        prop_assert_eq!(twice.excluded, 0);
        prop_assert_eq!(&twice.kept, &once.kept);
        prop_assert_eq!(once.kept.len() + once.excluded, records.len());
        prop_assert!(once.kept.iter().all(|r| !filter.is_non_liquidable(r.description())));
    }

    // ===================================================================
    // Aggregation equals the per-denomination sum of the input.
    // ===================================================================
    #[test]
    fn aggregation_matches_naive_sums(records in prop::collection::vec(arb_record(), 0..80)) {
        let totals = Aggregator::aggregate(&records).unwrap();
        let sum = |d: Denomination| -> Decimal {
            records.iter().filter(|r| r.denomination() == d).map(|r| r.amount()).sum()
        };
        prop_assert_eq!(totals.micro_total, sum(Denomination::Micro));
        prop_assert_eq!(totals.nominal_total, sum(Denomination::Nominal));
        prop_assert_eq!(totals.record_count, records.len());
        let breakdown_total: Decimal = totals.breakdown.iter().map(|d| d.subtotal).sum();
        prop_assert_eq!(breakdown_total, totals.micro_total + totals.nominal_total);
    }

    // ===================================================================
    // Rejected rows never contribute to totals.
    // ===================================================================
    #[test]
    fn rejected_rows_never_counted(rows in prop::collection::vec(arb_raw_row(), 0..50)) {
        let expected: Decimal = rows.iter().filter_map(|(_, v)| *v).sum();
        let valid = rows.iter().filter(|(_, v)| v.is_some()).count();

        let normalized = Normalizer::default().normalize(rows.into_iter().map(|(r, _)| r));
        prop_assert_eq!(normalized.accepted_count(), valid);

        let totals = Aggregator::aggregate(&normalized.records).unwrap();
        prop_assert_eq!(totals.nominal_total, expected);
    }
}
