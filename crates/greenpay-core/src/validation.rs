//! # Validation Module
//!
//! Input validation for voucher issuance and lookup.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: voucher-api                                                   │
//! │  ├── Wire decoding (protobuf, RFC 3339 timestamps, enum names)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Quantity range, positive amounts, validity window                  │
//! │  └── Voucher code format, company and passport fields                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  └── UNIQUE(code) ← the uniqueness invariant                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use greenpay_core::validation::{validate_batch_quantity, validate_voucher_code};
//!
//! assert!(validate_batch_quantity(3).is_ok());
//! assert!(validate_batch_quantity(0).is_err());
//!
//! let code = validate_voucher_code(" corp-lk3j2f-8x9qrt ").unwrap();
//! assert_eq!(code, "CORP-LK3J2F-8X9QRT");
//! ```

use chrono::{DateTime, Utc};

use crate::code::{normalize_voucher_code, parse_voucher_code, MAX_PREFIX_LEN};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::{MAX_AMOUNT_TOEA, MAX_BATCH_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest company or customer name accepted.
pub const MAX_NAME_LEN: usize = 200;

/// Longest passport number accepted.
pub const MAX_PASSPORT_LEN: usize = 20;

/// Longest payment reference accepted.
pub const MAX_REFERENCE_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

fn required_trimmed<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value)
}

/// Validates a company name and returns it trimmed.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_company_name(name: &str) -> ValidationResult<String> {
    required_trimmed("company_name", name, MAX_NAME_LEN).map(str::to_string)
}

/// Validates an optional free-text field.
///
/// Blank input becomes `None`; otherwise the trimmed value must fit in `max`
/// characters.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_trimmed(field, v, max).map(|v| Some(v.to_string())),
    }
}

/// Validates a passport number and returns it uppercased.
///
/// ## Rules
/// - Letters and digits only
/// - At most 20 characters
pub fn validate_passport_number(passport: &str) -> ValidationResult<String> {
    let passport = required_trimmed("passport_number", passport, MAX_PASSPORT_LEN)?;

    if !passport.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "passport_number".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(passport.to_ascii_uppercase())
}

/// Validates a voucher code prefix and returns it uppercased.
///
/// ## Rules
/// - 1 to 8 characters
/// - ASCII letters and digits only
pub fn validate_prefix(prefix: &str) -> ValidationResult<String> {
    let prefix = required_trimmed("prefix", prefix, MAX_PREFIX_LEN)?;

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "prefix".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(prefix.to_ascii_uppercase())
}

/// Normalises user-entered voucher code input and checks its format.
///
/// ## User Workflow
/// ```text
/// Gate agent types " corp-lk3j2f-8x9qrt "
///       │
///       ▼
/// validate_voucher_code ← THIS FUNCTION
///       │
///       ├── blank?          → Error: "voucher_code is required"
///       ├── bad format?     → Error: "voucher_code has invalid format"
///       └── OK "CORP-LK3J2F-8X9QRT" → lookup
/// ```
pub fn validate_voucher_code(input: &str) -> ValidationResult<String> {
    let code = normalize_voucher_code(input);

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "voucher_code".to_string(),
        });
    }

    parse_voucher_code(&code)?;
    Ok(code)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the number of vouchers in a batch.
///
/// Out-of-range requests are rejected, never clamped.
pub fn validate_batch_quantity(qty: i64) -> CoreResult<()> {
    if !(1..=MAX_BATCH_QUANTITY).contains(&qty) {
        return Err(CoreError::InvalidQuantity {
            requested: qty,
            min: 1,
            max: MAX_BATCH_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a voucher face value in toea: positive and at most
/// [`MAX_AMOUNT_TOEA`].
pub fn validate_amount_toea(toea: i64) -> ValidationResult<()> {
    if toea <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    if toea > MAX_AMOUNT_TOEA {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 1,
            max: MAX_AMOUNT_TOEA,
        });
    }

    Ok(())
}

/// Validates a GST rate in basis points (0% to 100%).
pub fn validate_gst_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "gst_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates that the validity window is non-empty.
pub fn validate_validity_window(
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
) -> ValidationResult<()> {
    if valid_until <= valid_from {
        return Err(ValidationError::InvalidValidityWindow {
            valid_from,
            valid_until,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string (batch and voucher ids).
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_validate_company_name() {
        assert_eq!(validate_company_name("  Acme Ltd ").unwrap(), "Acme Ltd");
        assert!(validate_company_name("").is_err());
        assert!(validate_company_name("   ").is_err());
        assert!(validate_company_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_optional_text() {
        assert_eq!(validate_optional_text("ref", None, 10).unwrap(), None);
        assert_eq!(validate_optional_text("ref", Some("  "), 10).unwrap(), None);
        assert_eq!(
            validate_optional_text("ref", Some(" INV-1 "), 10).unwrap(),
            Some("INV-1".to_string())
        );
        assert!(validate_optional_text("ref", Some("12345678901"), 10).is_err());
    }

    #[test]
    fn test_validate_passport_number() {
        assert_eq!(validate_passport_number(" p1234567 ").unwrap(), "P1234567");
        assert!(validate_passport_number("").is_err());
        assert!(validate_passport_number("P123 4567").is_err());
        assert!(validate_passport_number(&"A".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_prefix() {
        assert_eq!(validate_prefix("corp").unwrap(), "CORP");
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("TOOLONGPX").is_err());
        assert!(validate_prefix("CO-RP").is_err());
    }

    #[test]
    fn test_validate_voucher_code() {
        assert_eq!(
            validate_voucher_code("corp-lk3j2f-8x9qrt").unwrap(),
            "CORP-LK3J2F-8X9QRT"
        );
        assert!(matches!(
            validate_voucher_code("  "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_voucher_code("not a code"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_batch_quantity() {
        assert!(validate_batch_quantity(1).is_ok());
        assert!(validate_batch_quantity(MAX_BATCH_QUANTITY).is_ok());

        assert!(matches!(
            validate_batch_quantity(0),
            Err(CoreError::InvalidQuantity { requested: 0, .. })
        ));
        assert!(validate_batch_quantity(-3).is_err());
        assert!(validate_batch_quantity(MAX_BATCH_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_amount_toea() {
        assert!(validate_amount_toea(5000).is_ok());
        assert!(validate_amount_toea(0).is_err());
        assert!(validate_amount_toea(-100).is_err());
        assert!(validate_amount_toea(MAX_AMOUNT_TOEA).is_ok());
        assert!(matches!(
            validate_amount_toea(i64::MAX / 2),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_validity_window() {
        let from = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(validate_validity_window(from, from + Duration::days(1)).is_ok());
        assert!(validate_validity_window(from, from).is_err());
        assert!(validate_validity_window(from, from - Duration::days(1)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_gst_rate_bps() {
        assert!(validate_gst_rate_bps(0).is_ok());
        assert!(validate_gst_rate_bps(1000).is_ok());
        assert!(validate_gst_rate_bps(10001).is_err());
    }
}
