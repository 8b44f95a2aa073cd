//! # GreenPay Voucher API
//!
//! gRPC server for voucher issuance, validation and redemption.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Voucher API Services                              │
//! │                                                                         │
//! │  ┌──────────────────────────────┐  ┌────────────────┐                   │
//! │  │  VoucherService              │  │  HealthService │                   │
//! │  │                              │  │                │                   │
//! │  │ • IssueBatch                 │  │ • Check        │                   │
//! │  │ • IssueVoucher               │  │ • Watch        │                   │
//! │  │ • ValidateVoucher            │  │                │                   │
//! │  │ • RedeemVoucher              │  │                │                   │
//! │  │ • ListBatchVouchers          │  │                │                   │
//! │  └──────────────┬───────────────┘  └───────┬────────┘                   │
//! │                 │                          │                            │
//! │                 ▼                          ▼                            │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │            greenpay-db (SQLite, UNIQUE(code), retry)             │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]: `greenpay.toml` plus `GREENPAY_*` environment variables.

pub mod config;
pub mod error;
pub mod proto;
pub mod services;

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;

use greenpay_db::Database;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
}
