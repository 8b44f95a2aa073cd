//! # Error Types
//!
//! Domain-specific error types for greenpay-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  greenpay-core errors (this file)                                       │
//! │  ├── CoreError        - Voucher rule violations                         │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  greenpay-db errors (separate crate)                                    │
//! │  └── DbError          - Database failures, retry exhaustion             │
//! │                                                                         │
//! │  voucher-api errors (in app)                                            │
//! │  └── ApiError         - Mapped onto gRPC status codes                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Status        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Voucher business rule errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No voucher carries the given code.
    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),

    /// Voucher was already redeemed.
    ///
    /// ## User Workflow
    /// ```text
    /// Gate agent scans code
    ///      │
    ///      ▼
    /// redeem("CORP-LK3J2F-8X9QRT")
    ///      │
    ///      ▼
    /// VoucherAlreadyUsed { used_at: 2026-03-01T08:15:00Z }
    ///      │
    ///      ▼
    /// Agent sees: "already used on 2026-03-01"
    /// ```
    #[error("Voucher {code} has already been used on {}", .used_at.format("%Y-%m-%d"))]
    VoucherAlreadyUsed { code: String, used_at: DateTime<Utc> },

    /// Voucher validity window has lapsed.
    #[error("Voucher {code} expired on {}", .valid_until.format("%Y-%m-%d"))]
    VoucherExpired {
        code: String,
        valid_until: DateTime<Utc>,
    },

    /// Requested batch size outside the allowed range.
    #[error("Quantity {requested} must be between {min} and {max}")]
    InvalidQuantity { requested: i64, min: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before any storage is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed voucher code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// `valid_until` does not come after `valid_from`.
    #[error("valid_until ({valid_until}) must be after valid_from ({valid_from})")]
    InvalidValidityWindow {
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidQuantity {
            requested: 0,
            min: 1,
            max: 10_000,
        };
        assert_eq!(err.to_string(), "Quantity 0 must be between 1 and 10000");

        let used_at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 15, 0).unwrap();
        let err = CoreError::VoucherAlreadyUsed {
            code: "CORP-LK3J2F-8X9QRT".to_string(),
            used_at,
        };
        assert_eq!(
            err.to_string(),
            "Voucher CORP-LK3J2F-8X9QRT has already been used on 2026-03-01"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "company_name".to_string(),
        };
        assert_eq!(err.to_string(), "company_name is required");

        let err = ValidationError::TooLong {
            field: "prefix".to_string(),
            max: 8,
        };
        assert_eq!(err.to_string(), "prefix must be at most 8 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
