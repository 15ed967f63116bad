//! Overflow-checked `Decimal` arithmetic.
//!
//! Amounts and rates come from outside, so any sum or product may leave the
//! 96-bit range of `Decimal`. These helpers report that as [`Overflow`]
//! instead of panicking.

use rust_decimal::Decimal;
use thiserror::Error;

/// A figure left the range `Decimal` can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("decimal overflow while computing {stage}")]
pub struct Overflow {
    /// Name of the figure being computed.
    pub stage: &'static str,
}

pub fn add(a: Decimal, b: Decimal, stage: &'static str) -> Result<Decimal, Overflow> {
    a.checked_add(b).ok_or(Overflow { stage })
}

pub fn mul(a: Decimal, b: Decimal, stage: &'static str) -> Result<Decimal, Overflow> {
    a.checked_mul(b).ok_or(Overflow { stage })
}

/// Also fails on a zero divisor.
pub fn div(a: Decimal, b: Decimal, stage: &'static str) -> Result<Decimal, Overflow> {
    a.checked_div(b).ok_or(Overflow { stage })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_in_range() {
        assert_eq!(add(dec!(1.5), dec!(2), "sum"), Ok(dec!(3.5)));
        assert_eq!(mul(dec!(675), dec!(72.96), "product"), Ok(dec!(49248)));
        assert_eq!(div(dec!(49248), dec!(40), "ratio"), Ok(dec!(1231.2)));
    }

    #[test]
    fn test_overflow_names_the_stage() {
        assert_eq!(
            add(Decimal::MAX, Decimal::ONE, "micro total"),
            Err(Overflow { stage: "micro total" })
        );
        assert_eq!(
            mul(Decimal::MAX, dec!(2), "local amount").unwrap_err().to_string(),
            "decimal overflow while computing local amount"
        );
    }

    #[test]
    fn test_zero_divisor() {
        assert!(div(Decimal::ONE, Decimal::ZERO, "ratio").is_err());
    }
}
