//! Integral amounts and exact fraction arithmetic
//!
//! Allocations are whole base units. Fractions (threshold, perturbation factors) are
//! `Decimal` and applied with [`mul_floor`], which never rounds up and never drifts
//! across repeated perturb/clamp/reconcile passes.

use rust_decimal::{Decimal, RoundingStrategy};

/// Quantity of capital in the asset's smallest unit
pub type Amount = u128;

/// Decimal places kept when applying a fraction
const FRACTION_DP: u32 = 18;

/// `floor(amount * fraction)`, exact for fractions in `[0, 100]`.
///
/// Negative fractions yield zero. The fraction is truncated to 18 decimal places first.
pub fn mul_floor(amount: Amount, fraction: Decimal) -> Amount {
    if fraction.is_sign_negative() || fraction.is_zero() || amount == 0 {
        return 0;
    }

    let fraction = fraction.round_dp_with_strategy(FRACTION_DP, RoundingStrategy::ToZero);
    let mantissa = fraction.mantissa().unsigned_abs();
    let denominator = 10u128.pow(fraction.scale());

    // amount * m / d == (amount / d) * m + (amount % d) * m / d
    let whole = (amount / denominator).saturating_mul(mantissa);
    let rest = (amount % denominator).saturating_mul(mantissa) / denominator;
    whole.saturating_add(rest)
}

/// Sum of amounts, saturating at `Amount::MAX`
pub fn total<'a>(amounts: impl IntoIterator<Item = &'a Amount>) -> Amount {
    amounts
        .into_iter()
        .fold(0, |acc: Amount, a| acc.saturating_add(*a))
}
