//! Bounded multiplicative perturbation
//!
//! Independent allocators facing the same input must not emit bit-identical maps.
//! Each allocation is scaled by `1 + u`, `u` uniform in `[-r, r]` at parts-per-million
//! resolution, and floored. The result is re-clamped and reconciled afterwards.

use poolalloc_common::{types::amount::mul_floor, AllocationMap, PERTURBATION_RESOLUTION};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Perturbation magnitude in parts per million
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Perturbation {
    magnitude_ppm: i64,
}

impl Perturbation {
    /// `factor` is truncated to ppm resolution
    pub fn new(factor: Decimal) -> Self {
        let magnitude_ppm = (factor * Decimal::from(PERTURBATION_RESOLUTION))
            .trunc()
            .to_i64()
            .unwrap_or(0)
            .clamp(0, PERTURBATION_RESOLUTION - 1);
        Self { magnitude_ppm }
    }

    pub fn is_noop(&self) -> bool {
        self.magnitude_ppm == 0
    }

    pub fn magnitude_ppm(&self) -> i64 {
        self.magnitude_ppm
    }

    /// Draw one scale factor `1 + u`
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Decimal {
        let u = rng.gen_range(-self.magnitude_ppm..=self.magnitude_ppm);
        Decimal::new(PERTURBATION_RESOLUTION + u, 6)
    }

    /// Scale every allocation independently, in pool-id order
    pub fn apply<R: Rng + ?Sized>(&self, allocation: &mut AllocationMap, rng: &mut R) {
        if self.is_noop() {
            return;
        }
        for amount in allocation.values_mut() {
            *amount = mul_floor(*amount, self.draw(rng));
        }
    }
}
