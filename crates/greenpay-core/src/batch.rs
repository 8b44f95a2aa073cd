//! # Issuance Planning
//!
//! Turns issuance requests into validated, ready-to-insert voucher drafts.
//!
//! ## Where This Sits
//! ```text
//! BatchRequest ──► BatchPlan::new ← THIS MODULE (pure, no storage)
//!                      │  validate quantity, amount, company, window
//!                      │  default the validity window
//!                      │  generate N candidate codes
//!                      ▼
//!                 BatchPlan { batch, drafts }
//!                      │
//!                      ▼
//!          greenpay-db: insert with collision retry
//! ```
//!
//! Nothing here can fail because of a code collision: the drafts carry
//! candidate codes only, and the database decides whether they are unique.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreResult, ValidationError};
use crate::types::{
    Batch, BatchRequest, PaymentMethod, Voucher, VoucherCategory, VoucherRequest,
};
use crate::validation::{
    validate_amount_toea, validate_batch_quantity, validate_company_name, validate_optional_text,
    validate_passport_number, validate_validity_window, ValidationResult, MAX_NAME_LEN,
    MAX_REFERENCE_LEN,
};
use crate::MAX_VALIDITY_DAYS;

// =============================================================================
// Voucher Draft
// =============================================================================

/// A voucher that has not been persisted yet.
///
/// Only `code` changes between insert attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherDraft {
    pub id: String,
    pub code: String,
    pub category: VoucherCategory,
    pub amount_toea: i64,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub batch_id: Option<String>,
    pub company_name: Option<String>,
    pub passport_number: Option<String>,
    pub customer_name: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl VoucherDraft {
    /// Prefix used when (re)generating this draft's code.
    #[inline]
    pub fn prefix(&self) -> &'static str {
        self.category.prefix()
    }

    /// The voucher this draft becomes once inserted.
    pub fn to_voucher(&self) -> Voucher {
        Voucher {
            id: self.id.clone(),
            code: self.code.clone(),
            category: self.category,
            amount_toea: self.amount_toea,
            payment_method: self.payment_method,
            payment_reference: self.payment_reference.clone(),
            batch_id: self.batch_id.clone(),
            company_name: self.company_name.clone(),
            passport_number: self.passport_number.clone(),
            customer_name: self.customer_name.clone(),
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            used_at: None,
            created_at: self.created_at,
        }
    }
}

// =============================================================================
// Validity Window
// =============================================================================

/// Fills in a missing validity window.
///
/// - `valid_from` defaults to `now`
/// - `valid_until` defaults to `valid_from + validity_days`
pub fn resolve_validity_window(
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    validity_days: i64,
) -> ValidationResult<(DateTime<Utc>, DateTime<Utc>)> {
    if validity_days <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "validity_days".to_string(),
        });
    }

    if validity_days > MAX_VALIDITY_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "validity_days".to_string(),
            min: 1,
            max: MAX_VALIDITY_DAYS,
        });
    }

    let from = valid_from.unwrap_or(now);
    let until = valid_until.unwrap_or_else(|| from + Duration::days(validity_days));
    validate_validity_window(from, until)?;
    Ok((from, until))
}

// =============================================================================
// Batch Plan
// =============================================================================

/// A validated batch and its N voucher drafts.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub batch: Batch,
    pub drafts: Vec<VoucherDraft>,
}

impl BatchPlan {
    /// Validates `request` and builds the batch with one draft per voucher.
    ///
    /// `generate` receives a prefix and returns a candidate code; in
    /// production it is [`crate::code::generate_voucher_code`].
    ///
    /// ## Errors
    /// - `InvalidQuantity` when quantity is outside `[1, MAX_BATCH_QUANTITY]`
    /// - `Validation` for a blank company, non-positive amount or empty window
    pub fn new<G>(
        request: &BatchRequest,
        now: DateTime<Utc>,
        validity_days: i64,
        mut generate: G,
    ) -> CoreResult<Self>
    where
        G: FnMut(&str) -> String,
    {
        validate_batch_quantity(request.quantity)?;
        validate_amount_toea(request.amount_toea)?;
        let company_name = validate_company_name(&request.company_name)?;
        let payment_reference = validate_optional_text(
            "payment_reference",
            request.payment_reference.as_deref(),
            MAX_REFERENCE_LEN,
        )?;
        let (valid_from, valid_until) =
            resolve_validity_window(request.valid_from, request.valid_until, now, validity_days)?;

        let batch = Batch {
            id: Uuid::new_v4().to_string(),
            company_name,
            quantity: request.quantity,
            amount_toea: request.amount_toea,
            payment_method: request.payment_method,
            payment_reference,
            valid_from,
            valid_until,
            created_at: now,
        };

        let category = VoucherCategory::Corporate;
        let drafts = (0..request.quantity)
            .map(|_| VoucherDraft {
                id: Uuid::new_v4().to_string(),
                code: generate(category.prefix()),
                category,
                amount_toea: batch.amount_toea,
                payment_method: batch.payment_method,
                payment_reference: batch.payment_reference.clone(),
                batch_id: Some(batch.id.clone()),
                company_name: Some(batch.company_name.clone()),
                passport_number: None,
                customer_name: None,
                valid_from,
                valid_until,
                created_at: now,
            })
            .collect();

        Ok(BatchPlan { batch, drafts })
    }
}

// =============================================================================
// Single Voucher
// =============================================================================

/// Validates a single-voucher request and builds its draft.
///
/// ## Rules
/// - `Individual` vouchers need a passport number
/// - `Corporate` vouchers need a company name
pub fn plan_voucher<G>(
    request: &VoucherRequest,
    now: DateTime<Utc>,
    validity_days: i64,
    mut generate: G,
) -> CoreResult<VoucherDraft>
where
    G: FnMut(&str) -> String,
{
    validate_amount_toea(request.amount_toea)?;

    let passport_number = match request.passport_number.as_deref().map(str::trim) {
        None | Some("") if request.category == VoucherCategory::Individual => {
            return Err(ValidationError::Required {
                field: "passport_number".to_string(),
            }
            .into());
        }
        None | Some("") => None,
        Some(p) => Some(validate_passport_number(p)?),
    };

    let company_name = match request.category {
        VoucherCategory::Corporate => Some(validate_company_name(
            request.company_name.as_deref().unwrap_or_default(),
        )?),
        _ => validate_optional_text("company_name", request.company_name.as_deref(), MAX_NAME_LEN)?,
    };

    let customer_name =
        validate_optional_text("customer_name", request.customer_name.as_deref(), MAX_NAME_LEN)?;
    let payment_reference = validate_optional_text(
        "payment_reference",
        request.payment_reference.as_deref(),
        MAX_REFERENCE_LEN,
    )?;
    let (valid_from, valid_until) =
        resolve_validity_window(request.valid_from, request.valid_until, now, validity_days)?;

    Ok(VoucherDraft {
        id: Uuid::new_v4().to_string(),
        code: generate(request.category.prefix()),
        category: request.category,
        amount_toea: request.amount_toea,
        payment_method: request.payment_method,
        payment_reference,
        batch_id: None,
        company_name,
        passport_number,
        customer_name,
        valid_from,
        valid_until,
        created_at: now,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
