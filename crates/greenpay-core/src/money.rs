//! # Money Module
//!
//! Provides the `Money` type for voucher amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  GST on K50.00 at 10% computed in floats and rounded with toFixed(2)    │
//! │  drifts once it is summed over a 10,000-voucher corporate batch.        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Toea                                             │
//! │    K1.00 = 100 toea, every amount is an i64 count of toea               │
//! │    GST is computed once per total in basis points                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use greenpay_core::money::Money;
//! use greenpay_core::types::GstRate;
//!
//! let fee = Money::from_toea(5000); // K50.00
//! let subtotal = fee.multiply_quantity(3); // K150.00
//! let gst = subtotal.calculate_gst(GstRate::from_bps(1000));
//! assert_eq!(gst.toea(), 1500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::types::GstRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in toea (1/100 of a Papua New Guinea kina).
///
/// ## Where Money is Used
/// ```text
/// BatchRequest.amount_toea ──► Voucher.amount_toea ──► VoucherSummary.amount
///                    │
///                    └──► Batch totals (subtotal, GST, total)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from toea (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use greenpay_core::money::Money;
    ///
    /// let fee = Money::from_toea(5000); // K50.00
    /// assert_eq!(fee.toea(), 5000);
    /// ```
    #[inline]
    pub const fn from_toea(toea: i64) -> Self {
        Money(toea)
    }

    /// Creates a Money value from whole kina.
    #[inline]
    pub const fn from_kina(kina: i64) -> Self {
        Money(kina * 100)
    }

    /// Returns the value in toea.
    #[inline]
    pub const fn toea(&self) -> i64 {
        self.0
    }

    /// Returns the whole kina portion.
    #[inline]
    pub const fn kina(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the toea portion (always 0-99).
    #[inline]
    pub const fn toea_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Calculates GST, rounding half up to the nearest toea.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128 so a
    /// full 10,000-voucher batch cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use greenpay_core::money::Money;
    /// use greenpay_core::types::GstRate;
    ///
    /// let subtotal = Money::from_toea(1005); // K10.05
    /// let gst = subtotal.calculate_gst(GstRate::from_bps(1000));
    /// // K10.05 × 10% = K1.005 → K1.01
    /// assert_eq!(gst.toea(), 101);
    /// ```
    pub fn calculate_gst(&self, rate: GstRate) -> Money {
        let gst_toea = (i128::from(self.0) * i128::from(rate.bps()) + 5000) / 10000;
        // Saturates; amounts are bounded by validation long before this
        match i64::try_from(gst_toea) {
            Ok(toea) => Money::from_toea(toea),
            Err(_) if gst_toea < 0 => Money::from_toea(i64::MIN),
            Err(_) => Money::from_toea(i64::MAX),
        }
    }

    /// Multiplies money by a quantity (e.g. vouchers in a batch),
    /// saturating at the `i64` bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(toea) => Some(Money(toea)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(toea) => Some(Money(toea)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Kina display, e.g. `K50.00`. Localised formatting belongs to the portal.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}K{}.{:02}", sign, self.kina().abs(), self.toea_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toea() {
        let money = Money::from_toea(5099);
        assert_eq!(money.toea(), 5099);
        assert_eq!(money.kina(), 50);
        assert_eq!(money.toea_part(), 99);
        assert_eq!(Money::from_kina(50), Money::from_toea(5000));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_toea(5000).to_string(), "K50.00");
        assert_eq!(Money::from_toea(1099).to_string(), "K10.99");
        assert_eq!(Money::from_toea(-550).to_string(), "-K5.50");
        assert_eq!(Money::zero().to_string(), "K0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_toea(1000);
        let b = Money::from_toea(500);

        assert_eq!((a + b).toea(), 1500);
        assert_eq!((a - b).toea(), 500);
        assert_eq!((a * 3).toea(), 3000);

        let mut total = Money::zero();
        total += a;
        total += b;
        assert_eq!(total.toea(), 1500);
    }

    #[test]
    fn test_gst_default_rate() {
        let subtotal = Money::from_kina(150);
        let gst = subtotal.calculate_gst(GstRate::default());
        assert_eq!(gst, Money::from_kina(15));
    }

    #[test]
    fn test_gst_rounds_half_up() {
        // K0.05 at 10% = 0.5 toea → 1 toea
        assert_eq!(Money::from_toea(5).calculate_gst(GstRate::from_bps(1000)).toea(), 1);
        // K0.04 at 10% = 0.4 toea → 0 toea
        assert_eq!(Money::from_toea(4).calculate_gst(GstRate::from_bps(1000)).toea(), 0);
    }

    #[test]
    fn test_gst_on_largest_batch_does_not_overflow() {
        let subtotal = Money::from_kina(50).multiply_quantity(crate::MAX_BATCH_QUANTITY);
        assert_eq!(subtotal.toea(), 50_000_000);
        assert_eq!(subtotal.calculate_gst(GstRate::default()).toea(), 5_000_000);
    }

    #[test]
    fn test_largest_amount_batch_fits() {
        let subtotal = Money::from_toea(crate::MAX_AMOUNT_TOEA)
            .checked_mul(crate::MAX_BATCH_QUANTITY)
            .unwrap();
        let gst = subtotal.calculate_gst(GstRate::from_bps(10000));
        assert_eq!(gst, subtotal);
        assert!(subtotal.checked_add(gst).is_some());
    }

    #[test]
    fn test_overflow_saturates_or_reports() {
        let huge = Money::from_toea(i64::MAX / 2);
        assert_eq!(huge.checked_mul(3), None);
        assert_eq!(huge.multiply_quantity(3).toea(), i64::MAX);
        assert_eq!(huge.checked_add(huge).map(|m| m.toea()), Some(i64::MAX - 1));
        assert_eq!(Money::from_toea(i64::MAX).checked_add(Money::from_toea(1)), None);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
        assert!(Money::from_toea(1).is_positive());
    }
}
