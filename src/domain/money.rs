//! Monetary representation.
//!
//! All currency values are `Decimal`. Intermediate arithmetic keeps full
//! precision; values are rounded to two places only where they leave the
//! engine (persisted amounts, ledger postings, settlement costs).

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency amount.
pub type Money = Decimal;

/// Fractional digits carried by persisted monetary fields.
pub const MONEY_SCALE: u32 = 2;

/// Round a value to the persisted two-decimal scale.
#[must_use]
pub fn round_money(value: Decimal) -> Money {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a value in canonical two-decimal text.
#[must_use]
pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", round_money(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(dec!(0.005)), dec!(0.01));
        assert_eq!(round_money(dec!(12.344)), dec!(12.34));
        assert_eq!(round_money(dec!(-0.005)), dec!(-0.01));
    }

    #[test]
    fn formats_with_two_places() {
        assert_eq!(format_money(dec!(100)), "100.00");
        assert_eq!(format_money(dec!(85.5)), "85.50");
    }
}
