//! # Cash Reconciliation
//!
//! End-of-day reconciliation for counter agents: compare the cash the drawer
//! should hold against what was counted.
//!
//! ```text
//! opening float ──┐
//!                 ├──► expected cash ──┐
//! cash takings ───┘                    ├──► variance = actual - expected
//! counted notes/coins ──► actual cash ─┘
//!
//!   variance > 0  Over       variance < 0  Short       variance = 0  Balanced
//! ```
//!
//! Card, bank transfer, EFTPOS and online takings never pass through the
//! drawer; they only count towards `total_collected`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PaymentMethod, Voucher};
use crate::validation::ValidationResult;
use crate::MAX_AMOUNT_TOEA;

// =============================================================================
// Denominations
// =============================================================================

/// PGK notes and coins accepted at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Denomination {
    K100,
    K50,
    K20,
    K10,
    K5,
    K2,
    K1,
    T50,
    T20,
    T10,
    T5,
}

impl Denomination {
    /// Largest first.
    pub const ALL: [Denomination; 11] = [
        Denomination::K100,
        Denomination::K50,
        Denomination::K20,
        Denomination::K10,
        Denomination::K5,
        Denomination::K2,
        Denomination::K1,
        Denomination::T50,
        Denomination::T20,
        Denomination::T10,
        Denomination::T5,
    ];

    pub const fn value_toea(&self) -> i64 {
        match self {
            Denomination::K100 => 10_000,
            Denomination::K50 => 5_000,
            Denomination::K20 => 2_000,
            Denomination::K10 => 1_000,
            Denomination::K5 => 500,
            Denomination::K2 => 200,
            Denomination::K1 => 100,
            Denomination::T50 => 50,
            Denomination::T20 => 20,
            Denomination::T10 => 10,
            Denomination::T5 => 5,
        }
    }

    pub const fn value(&self) -> Money {
        Money::from_toea(self.value_toea())
    }
}

// =============================================================================
// Cash Count
// =============================================================================

/// Pieces counted per denomination. Missing fields deserialize as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CashCount {
    pub k100: u32,
    pub k50: u32,
    pub k20: u32,
    pub k10: u32,
    pub k5: u32,
    pub k2: u32,
    pub k1: u32,
    pub t50: u32,
    pub t20: u32,
    pub t10: u32,
    pub t5: u32,
}

impl CashCount {
    pub fn count(&self, denomination: Denomination) -> u32 {
        match denomination {
            Denomination::K100 => self.k100,
            Denomination::K50 => self.k50,
            Denomination::K20 => self.k20,
            Denomination::K10 => self.k10,
            Denomination::K5 => self.k5,
            Denomination::K2 => self.k2,
            Denomination::K1 => self.k1,
            Denomination::T50 => self.t50,
            Denomination::T20 => self.t20,
            Denomination::T10 => self.t10,
            Denomination::T5 => self.t5,
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, denomination: Denomination, pieces: u32) -> Self {
        let slot = match denomination {
            Denomination::K100 => &mut self.k100,
            Denomination::K50 => &mut self.k50,
            Denomination::K20 => &mut self.k20,
            Denomination::K10 => &mut self.k10,
            Denomination::K5 => &mut self.k5,
            Denomination::K2 => &mut self.k2,
            Denomination::K1 => &mut self.k1,
            Denomination::T50 => &mut self.t50,
            Denomination::T20 => &mut self.t20,
            Denomination::T10 => &mut self.t10,
            Denomination::T5 => &mut self.t5,
        };
        *slot = pieces;
        self
    }

    /// Value of the counted cash.
    ///
    /// `u32::MAX` K100 notes is about 4.3e13 toea, so the sum over all
    /// eleven denominations cannot leave `i64`.
    pub fn total(&self) -> Money {
        let toea = Denomination::ALL
            .iter()
            .map(|d| d.value_toea() * i64::from(self.count(*d)))
            .sum();
        Money::from_toea(toea)
    }
}

// =============================================================================
// Takings by Payment Method
// =============================================================================

/// What an agent took in over the day, split by payment method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentTotals {
    pub cash: Money,
    pub card: Money,
    pub bank_transfer: Money,
    pub eftpos: Money,
    pub online: Money,
    /// Number of sales recorded.
    pub count: u32,
}

impl PaymentTotals {
    /// Sums the face value of `vouchers` by payment method.
    pub fn from_vouchers<'a>(vouchers: impl IntoIterator<Item = &'a Voucher>) -> Self {
        let mut totals = PaymentTotals::default();
        for voucher in vouchers {
            totals.record(voucher.payment_method, voucher.amount());
        }
        totals
    }

    pub fn record(&mut self, method: PaymentMethod, amount: Money) {
        let bucket = match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Card => &mut self.card,
            PaymentMethod::BankTransfer => &mut self.bank_transfer,
            PaymentMethod::Eftpos => &mut self.eftpos,
            PaymentMethod::Online => &mut self.online,
        };
        *bucket += amount;
        self.count = self.count.saturating_add(1);
    }

    /// Takings that never touch the cash drawer.
    pub fn non_cash(&self) -> Money {
        self.card + self.bank_transfer + self.eftpos + self.online
    }

    pub fn total(&self) -> Money {
        self.cash + self.non_cash()
    }
}

// =============================================================================
// Variance
// =============================================================================

/// Counted minus expected. Positive means the drawer is over.
pub fn calculate_variance(expected: Money, actual: Money) -> Money {
    Money::from_toea(actual.toea().saturating_sub(expected.toea()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VarianceKind {
    Balanced,
    Over,
    Short,
}

impl VarianceKind {
    pub fn of(variance: Money) -> Self {
        match variance.toea() {
            0 => VarianceKind::Balanced,
            v if v > 0 => VarianceKind::Over,
            _ => VarianceKind::Short,
        }
    }
}

/// Result of reconciling one agent's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReconciliationSummary {
    pub opening_float: Money,
    pub expected_cash: Money,
    pub actual_cash: Money,
    pub variance: Money,
    pub variance_kind: VarianceKind,
    /// Counted cash plus non-cash takings.
    pub total_collected: Money,
}

/// Reconciles a drawer.
///
/// The opening float must be between zero and
/// [`MAX_AMOUNT_TOEA`](crate::MAX_AMOUNT_TOEA).
pub fn reconcile(
    opening_float: Money,
    takings: &PaymentTotals,
    counted: &CashCount,
) -> ValidationResult<ReconciliationSummary> {
    if opening_float.toea() < 0 || opening_float.toea() > MAX_AMOUNT_TOEA {
        return Err(ValidationError::OutOfRange {
            field: "opening_float".to_string(),
            min: 0,
            max: MAX_AMOUNT_TOEA,
        });
    }

    let expected_cash = opening_float + takings.cash;
    let actual_cash = counted.total();
    let variance = calculate_variance(expected_cash, actual_cash);

    Ok(ReconciliationSummary {
        opening_float,
        expected_cash,
        actual_cash,
        variance,
        variance_kind: VarianceKind::of(variance),
        total_collected: actual_cash + takings.non_cash(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn sale(method: PaymentMethod, amount_toea: i64) -> Voucher {
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();
        Voucher {
            id: "7c9e6679-7425-40de-944b-e07fc1f90ae7".to_string(),
            code: "IND-LK3J2F-8X9QRT".to_string(),
            category: crate::VoucherCategory::Individual,
            amount_toea,
            payment_method: method,
            payment_reference: None,
            batch_id: None,
            company_name: None,
            passport_number: Some("P1234567".to_string()),
            customer_name: None,
            valid_from: at,
            valid_until: at + Duration::days(365),
            used_at: None,
            created_at: at,
        }
    }

    #[test]
    fn test_denomination_total() {
        let count = CashCount::default()
            .with(Denomination::K100, 2)
            .with(Denomination::K50, 1)
            .with(Denomination::K2, 3)
            .with(Denomination::T50, 1)
            .with(Denomination::T5, 3);

        // K200 + K50 + K6 + K0.50 + K0.15
        assert_eq!(count.total().toea(), 25_665);
        assert_eq!(CashCount::default().total(), Money::zero());
    }

    #[test]
    fn test_every_denomination_counts() {
        let count = Denomination::ALL
            .iter()
            .fold(CashCount::default(), |c, d| c.with(*d, 1));
        // K188.85
        assert_eq!(count.total().toea(), 18_885);
    }

    #[test]
    fn test_largest_count_fits() {
        let count = Denomination::ALL
            .iter()
            .fold(CashCount::default(), |c, d| c.with(*d, u32::MAX));
        assert!(count.total().is_positive());
    }

    #[test]
    fn test_variance_sign() {
        let expected = Money::from_kina(500);
        assert_eq!(calculate_variance(expected, Money::from_kina(520)).toea(), 2_000);
        assert_eq!(calculate_variance(expected, Money::from_kina(480)).toea(), -2_000);

        assert_eq!(VarianceKind::of(Money::from_toea(5)), VarianceKind::Over);
        assert_eq!(VarianceKind::of(Money::from_toea(-5)), VarianceKind::Short);
        assert_eq!(VarianceKind::of(Money::zero()), VarianceKind::Balanced);
    }

    #[test]
    fn test_payment_totals_from_vouchers() {
        let sales = [
            sale(PaymentMethod::Cash, 5000),
            sale(PaymentMethod::Cash, 5000),
            sale(PaymentMethod::Card, 5000),
            sale(PaymentMethod::Eftpos, 5000),
        ];

        let totals = PaymentTotals::from_vouchers(&sales);
        assert_eq!(totals.cash, Money::from_kina(100));
        assert_eq!(totals.card, Money::from_kina(50));
        assert_eq!(totals.eftpos, Money::from_kina(50));
        assert_eq!(totals.non_cash(), Money::from_kina(100));
        assert_eq!(totals.total(), Money::from_kina(200));
        assert_eq!(totals.count, 4);
    }

    #[test]
    fn test_reconcile_short_drawer() {
        let mut takings = PaymentTotals::default();
        takings.record(PaymentMethod::Cash, Money::from_kina(150));
        takings.record(PaymentMethod::BankTransfer, Money::from_kina(50));

        // Float K100 + cash K150 = K250 expected, K245 counted
        let counted = CashCount::default()
            .with(Denomination::K100, 2)
            .with(Denomination::K20, 2)
            .with(Denomination::K5, 1);

        let summary = reconcile(Money::from_kina(100), &takings, &counted).unwrap();
        assert_eq!(summary.expected_cash, Money::from_kina(250));
        assert_eq!(summary.actual_cash, Money::from_kina(245));
        assert_eq!(summary.variance, Money::from_toea(-500));
        assert_eq!(summary.variance_kind, VarianceKind::Short);
        assert_eq!(summary.total_collected, Money::from_kina(295));
    }

    #[test]
    fn test_reconcile_rejects_bad_float() {
        let takings = PaymentTotals::default();
        let counted = CashCount::default();

        assert!(matches!(
            reconcile(Money::from_toea(-1), &takings, &counted),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(reconcile(Money::from_toea(MAX_AMOUNT_TOEA + 1), &takings, &counted).is_err());
        assert_eq!(
            reconcile(Money::zero(), &takings, &counted)
                .unwrap()
                .variance_kind,
            VarianceKind::Balanced
        );
    }

    #[test]
    fn test_cash_count_json_defaults_missing_fields() {
        let count: CashCount = serde_json::from_str(r#"{"k50": 3, "t10": 4}"#).unwrap();
        assert_eq!(count.total().toea(), 15_040);
    }
}
