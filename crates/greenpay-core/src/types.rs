//! # Domain Types
//!
//! Core domain types used throughout GreenPay.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │     Batch       │   │    Voucher      │   │ VoucherSummary  │        │
//! │  │  ─────────────  │1:N│  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │──►│  id (UUID)      │──►│  code           │        │
//! │  │  company_name   │   │  code (unique)  │   │  valid_from     │        │
//! │  │  quantity       │   │  amount_toea    │   │  valid_until    │        │
//! │  │  amount_toea    │   │  valid window   │   │  amount_toea    │        │
//! │  └─────────────────┘   │  used_at        │   └─────────────────┘        │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │ VoucherCategory │   │  VoucherStatus  │   │  PaymentMethod  │        │
//! │  │  Individual IND │   │  Active         │   │  Cash, Card     │        │
//! │  │  Corporate CORP │   │  Used           │   │  BankTransfer   │        │
//! │  │  Online     ONL │   │  Expired        │   │  Eftpos, Online │        │
//! │  │  General    VCH │   │  (derived)      │   │                 │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every voucher has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `code`: human-readable, printed on the voucher and scanned at the gate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// GST Rate
// =============================================================================

/// GST rate represented in basis points (bps).
///
/// 1000 bps = 10%, the PNG standard rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GstRate(u32);

impl GstRate {
    /// Creates a GST rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        GstRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for GstRate {
    fn default() -> Self {
        GstRate(crate::DEFAULT_GST_BPS)
    }
}

// =============================================================================
// Voucher Category
// =============================================================================

/// How a voucher was sold. Determines the code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VoucherCategory {
    /// Counter sale to a single passenger.
    Individual,
    /// Bulk purchase by a company.
    Corporate,
    /// Bought through the public payment flow.
    Online,
    /// Issued without a specific channel.
    General,
}

impl VoucherCategory {
    /// All categories, in display order.
    pub const ALL: [VoucherCategory; 4] = [
        VoucherCategory::Individual,
        VoucherCategory::Corporate,
        VoucherCategory::Online,
        VoucherCategory::General,
    ];

    /// Code prefix printed at the start of every voucher code.
    pub const fn prefix(&self) -> &'static str {
        match self {
            VoucherCategory::Individual => "IND",
            VoucherCategory::Corporate => "CORP",
            VoucherCategory::Online => "ONL",
            VoucherCategory::General => "VCH",
        }
    }

    /// Reverse of [`VoucherCategory::prefix`].
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.prefix().eq_ignore_ascii_case(prefix))
    }

    /// Snake-case name, as stored and serialized.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VoucherCategory::Individual => "individual",
            VoucherCategory::Corporate => "corporate",
            VoucherCategory::Online => "online",
            VoucherCategory::General => "general",
        }
    }
}

impl Default for VoucherCategory {
    fn default() -> Self {
        VoucherCategory::General
    }
}

impl fmt::Display for VoucherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoucherCategory {
    type Err = ValidationError;

    /// Accepts either the name (`corporate`) or the prefix (`CORP`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .or_else(|| Self::from_prefix(s))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Self::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash at the counter.
    Cash,
    /// Card on an external terminal.
    Card,
    /// Bank transfer, usually for corporate invoices.
    BankTransfer,
    /// EFTPOS terminal.
    Eftpos,
    /// Online payment gateway.
    Online,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::BankTransfer,
        PaymentMethod::Eftpos,
        PaymentMethod::Online,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Eftpos => "eftpos",
            PaymentMethod::Online => "online",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    /// Case-insensitive; spaces and hyphens count as underscores
    /// (`"BANK TRANSFER"` parses as `BankTransfer`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: Self::ALL.iter().map(|m| m.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Voucher Status
// =============================================================================

/// Lifecycle state of a voucher.
///
/// Never stored: always derived from `used_at` and `valid_until` so that
/// expiry needs no background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VoucherStatus {
    /// Can be redeemed.
    Active,
    /// Already redeemed.
    Used,
    /// Validity window has lapsed.
    Expired,
}

impl VoucherStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            VoucherStatus::Active => "active",
            VoucherStatus::Used => "used",
            VoucherStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Voucher
// =============================================================================

/// An issued exit-fee voucher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Voucher {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable code, unique for the lifetime of the system.
    pub code: String,

    pub category: VoucherCategory,

    /// Face value in toea.
    pub amount_toea: i64,

    pub payment_method: PaymentMethod,

    /// Receipt number, gateway transaction id, invoice number, ...
    pub payment_reference: Option<String>,

    /// Set for vouchers issued as part of a corporate batch.
    pub batch_id: Option<String>,

    pub company_name: Option<String>,

    pub passport_number: Option<String>,

    pub customer_name: Option<String>,

    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,

    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,

    /// When the voucher was redeemed at the gate.
    #[ts(as = "Option<String>")]
    pub used_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Voucher {
    /// Derives the status at `now`.
    ///
    /// ```text
    /// used_at set?          ──► Used
    /// now > valid_until?    ──► Expired
    /// otherwise             ──► Active
    /// ```
    pub fn status_at(&self, now: DateTime<Utc>) -> VoucherStatus {
        if self.used_at.is_some() {
            VoucherStatus::Used
        } else if now > self.valid_until {
            VoucherStatus::Expired
        } else {
            VoucherStatus::Active
        }
    }

    /// Returns the face value as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_toea(self.amount_toea)
    }

    /// The subset of fields handed back to issuers.
    pub fn summary(&self) -> VoucherSummary {
        VoucherSummary {
            code: self.code.clone(),
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            amount_toea: self.amount_toea,
        }
    }
}

/// What an issuer gets back for every voucher it created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoucherSummary {
    pub code: String,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,
    pub amount_toea: i64,
}

/// A voucher together with its status at lookup time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoucherLookup {
    pub voucher: Voucher,
    pub status: VoucherStatus,
}

// =============================================================================
// Batch
// =============================================================================

/// A group of corporate vouchers issued together under shared attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Batch {
    pub id: String,
    pub company_name: String,
    pub quantity: i64,
    /// Face value of each voucher in toea.
    pub amount_toea: i64,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Batch {
    /// Invoice totals for the whole batch.
    pub fn totals(&self, rate: GstRate) -> BatchTotals {
        let subtotal = Money::from_toea(self.amount_toea).multiply_quantity(self.quantity);
        let gst = subtotal.calculate_gst(rate);
        BatchTotals {
            subtotal,
            gst,
            total: subtotal
                .checked_add(gst)
                .unwrap_or(Money::from_toea(i64::MAX)),
        }
    }
}

/// Subtotal, GST and total of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchTotals {
    pub subtotal: Money,
    pub gst: Money,
    pub total: Money,
}

/// Result of a successful batch issuance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IssuedBatch {
    pub batch: Batch,
    pub vouchers: Vec<VoucherSummary>,
}

// =============================================================================
// Requests
// =============================================================================

/// Input for corporate bulk issuance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchRequest {
    pub company_name: String,
    /// Number of vouchers, 1 to [`crate::MAX_BATCH_QUANTITY`].
    pub quantity: i64,
    pub amount_toea: i64,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    /// Defaults to the issuance time.
    #[ts(as = "Option<String>")]
    pub valid_from: Option<DateTime<Utc>>,
    /// Defaults to `valid_from` + [`crate::DEFAULT_VALIDITY_DAYS`].
    #[ts(as = "Option<String>")]
    pub valid_until: Option<DateTime<Utc>>,
}

/// Input for issuing a single voucher (counter or online purchase).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoucherRequest {
    pub category: VoucherCategory,
    pub amount_toea: i64,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub company_name: Option<String>,
    pub passport_number: Option<String>,
    pub customer_name: Option<String>,
    #[ts(as = "Option<String>")]
    pub valid_from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub valid_until: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn voucher(valid_until: DateTime<Utc>, used_at: Option<DateTime<Utc>>) -> Voucher {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Voucher {
            id: "7c9e6679-7425-40de-944b-e07fc1f90ae7".to_string(),
            code: "CORP-LK3J2F-8X9QRT".to_string(),
            category: VoucherCategory::Corporate,
            amount_toea: 5000,
            payment_method: PaymentMethod::BankTransfer,
            payment_reference: Some("INV-2026-0001".to_string()),
            batch_id: None,
            company_name: Some("Acme".to_string()),
            passport_number: None,
            customer_name: None,
            valid_from: created,
            valid_until,
            used_at,
            created_at: created,
        }
    }

    #[test]
    fn test_status_derivation() {
        let until = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();
        let v = voucher(until, None);

        assert_eq!(v.status_at(until - Duration::days(1)), VoucherStatus::Active);
        // The last instant of the window still counts
        assert_eq!(v.status_at(until), VoucherStatus::Active);
        assert_eq!(v.status_at(until + Duration::seconds(1)), VoucherStatus::Expired);

        let used = voucher(until, Some(until - Duration::days(10)));
        // Used wins over expired
        assert_eq!(used.status_at(until + Duration::days(1)), VoucherStatus::Used);
    }

    #[test]
    fn test_summary_copies_issuer_fields() {
        let until = Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap();
        let v = voucher(until, None);
        let summary = v.summary();
        assert_eq!(summary.code, v.code);
        assert_eq!(summary.amount_toea, 5000);
        assert_eq!(summary.valid_until, until);
    }

    #[test]
    fn test_category_prefixes() {
        assert_eq!(VoucherCategory::Corporate.prefix(), "CORP");
        assert_eq!(VoucherCategory::from_prefix("ind"), Some(VoucherCategory::Individual));
        assert_eq!(VoucherCategory::from_prefix("XYZ"), None);
        assert_eq!("online".parse::<VoucherCategory>().unwrap(), VoucherCategory::Online);
        assert_eq!("VCH".parse::<VoucherCategory>().unwrap(), VoucherCategory::General);
        assert!("lottery".parse::<VoucherCategory>().is_err());
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("CASH".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(
            "Bank Transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert_eq!("eftpos".parse::<PaymentMethod>().unwrap(), PaymentMethod::Eftpos);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_voucher_json_uses_snake_case_enums() {
        let until = Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap();
        let json = serde_json::to_value(voucher(until, None)).unwrap();

        assert_eq!(json["category"], "corporate");
        assert_eq!(json["payment_method"], "bank_transfer");
        assert_eq!(json["used_at"], serde_json::Value::Null);
        assert_eq!(
            serde_json::to_value(VoucherStatus::Expired).unwrap(),
            "expired"
        );
    }

    #[test]
    fn test_batch_totals() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let batch = Batch {
            id: "b1".to_string(),
            company_name: "Acme".to_string(),
            quantity: 3,
            amount_toea: 5000,
            payment_method: PaymentMethod::Cash,
            payment_reference: None,
            valid_from: now,
            valid_until: now + Duration::days(365),
            created_at: now,
        };

        let totals = batch.totals(GstRate::default());
        assert_eq!(totals.subtotal, Money::from_kina(150));
        assert_eq!(totals.gst, Money::from_kina(15));
        assert_eq!(totals.total, Money::from_kina(165));
    }

    #[test]
    fn test_gst_rate() {
        let rate = GstRate::from_bps(1000);
        assert_eq!(rate.bps(), 1000);
        assert!((rate.percentage() - 10.0).abs() < 0.001);
        assert_eq!(GstRate::default(), rate);
    }
}
