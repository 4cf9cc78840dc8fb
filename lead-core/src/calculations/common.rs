//! Shared arithmetic for estimate calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to whole cents, half away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use lead_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(1027.125)), dec!(1027.13));
/// assert_eq!(round_half_up(dec!(1027.124)), dec!(1027.12));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// How far `count` exceeds `included`, as a decimal; zero when it does not.
pub fn excess(count: u32, included: u32) -> Decimal {
    Decimal::from(count.saturating_sub(included))
}

/// Contribution of a multiplicative `factor` applied to `running`.
///
/// A factor of 1 contributes nothing; the result is rounded to cents.
/// `None` when the product does not fit in a [`Decimal`].
pub fn factor_contribution(running: Decimal, factor: Decimal) -> Option<Decimal> {
    let increase = factor.checked_sub(Decimal::ONE)?;
    running.checked_mul(increase).map(round_half_up)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up
    // =========================================================================

    #[test]
    fn round_half_up_rounds_midpoint_up() {
        assert_eq!(round_half_up(dec!(10.005)), dec!(10.01));
    }

    #[test]
    fn round_half_up_rounds_below_midpoint_down() {
        assert_eq!(round_half_up(dec!(10.004)), dec!(10.00));
    }

    #[test]
    fn round_half_up_keeps_cents() {
        assert_eq!(round_half_up(dec!(4675.50)), dec!(4675.50));
    }

    // =========================================================================
    // excess
    // =========================================================================

    #[test]
    fn excess_counts_only_above_included() {
        assert_eq!(excess(6, 4), dec!(2));
    }

    #[test]
    fn excess_is_zero_at_or_below_included() {
        assert_eq!(excess(4, 4), Decimal::ZERO);
        assert_eq!(excess(1, 4), Decimal::ZERO);
    }

    // =========================================================================
    // factor_contribution
    // =========================================================================

    #[test]
    fn factor_contribution_of_unit_factor_is_zero() {
        assert_eq!(factor_contribution(dec!(4675), Decimal::ONE), Some(dec!(0.00)));
    }

    #[test]
    fn factor_contribution_is_the_increase() {
        assert_eq!(factor_contribution(dec!(4675), dec!(1.20)), Some(dec!(935.00)));
    }

    #[test]
    fn factor_contribution_reports_overflow() {
        assert_eq!(factor_contribution(Decimal::MAX, dec!(3)), None);
    }
}
