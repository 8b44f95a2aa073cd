//! Error types for the Voucher API.
//!
//! ```text
//! ValidationError ─┐
//! CoreError ───────┼─► ApiError ─► tonic::Status
//! DbError ─────────┘
//! ```

use greenpay_core::{CoreError, ValidationError};
use greenpay_db::DbError;
use tonic::Status;
use tracing::error;

/// Voucher API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The voucher exists but is in the wrong state (used, expired).
    #[error("{0}")]
    FailedPrecondition(String),

    /// Issuance gave up; the client may retry the whole request.
    #[error("Aborted: {0}")]
    Aborted(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        let msg = error.to_string();
        match error {
            CoreError::VoucherNotFound(_) => ApiError::NotFound(msg),
            CoreError::VoucherAlreadyUsed { .. } | CoreError::VoucherExpired { .. } => {
                ApiError::FailedPrecondition(msg)
            }
            CoreError::InvalidQuantity { .. } | CoreError::Validation(_) => {
                ApiError::InvalidRequest(msg)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::InvalidRequest(error.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::NotFound(error.to_string()),
            DbError::UniqueViolation { .. } => ApiError::AlreadyExists(error.to_string()),
            DbError::RetryExhausted { .. } => ApiError::Aborted(error.to_string()),
            DbError::PoolExhausted => ApiError::ResourceExhausted(error.to_string()),
            DbError::ConnectionFailed(_) => ApiError::Unavailable(error.to_string()),
            DbError::ForeignKeyViolation { .. }
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::Internal(_) => {
                error!(error = %error, "Database failure");
                ApiError::Internal(error.to_string())
            }
        }
    }
}

impl From<ApiError> for Status {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::InvalidRequest(msg) => Status::invalid_argument(msg),
            ApiError::NotFound(msg) => Status::not_found(msg),
            ApiError::AlreadyExists(msg) => Status::already_exists(msg),
            ApiError::FailedPrecondition(msg) => Status::failed_precondition(msg),
            ApiError::Aborted(msg) => Status::aborted(msg),
            ApiError::ResourceExhausted(msg) => Status::resource_exhausted(msg),
            ApiError::Unavailable(msg) => Status::unavailable(msg),
            ApiError::Internal(msg) => Status::internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tonic::Code;

    fn status(error: impl Into<ApiError>) -> Status {
        Status::from(error.into())
    }

    #[test]
    fn test_domain_errors_map_to_client_codes() {
        let used_at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 15, 0).unwrap();

        assert_eq!(
            status(CoreError::VoucherNotFound("VCH-1-ABCDEF".into())).code(),
            Code::NotFound
        );
        let used = status(DbError::Domain(CoreError::VoucherAlreadyUsed {
            code: "VCH-1-ABCDEF".into(),
            used_at,
        }));
        assert_eq!(used.code(), Code::FailedPrecondition);
        assert!(used.message().contains("2026-03-01"));

        assert_eq!(
            status(CoreError::InvalidQuantity {
                requested: 0,
                min: 1,
                max: 10_000
            })
            .code(),
            Code::InvalidArgument
        );
    }

    #[test]
    fn test_storage_errors_map_to_server_codes() {
        assert_eq!(
            status(DbError::RetryExhausted {
                attempts: 3,
                persisted: 0,
                requested: 5
            })
            .code(),
            Code::Aborted
        );
        assert_eq!(status(DbError::PoolExhausted).code(), Code::ResourceExhausted);
        assert_eq!(
            status(DbError::ConnectionFailed("Pool is closed".into())).code(),
            Code::Unavailable
        );
        assert_eq!(
            status(DbError::QueryFailed("disk I/O error".into())).code(),
            Code::Internal
        );
    }
}
