//! # greenpay-db: Database Layer for GreenPay
//!
//! This crate provides voucher storage for GreenPay.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GreenPay Data Flow                               │
//! │                                                                         │
//! │  gRPC request (IssueBatch)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    greenpay-db (THIS CRATE)                     │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐     │    │
//! │  │   │   Database    │   │ VoucherIssuer  │   │  Migrations  │     │    │
//! │  │   │   (pool.rs)   │   │ (issuance.rs)  │   │  (embedded)  │     │    │
//! │  │   │               │   │                │   │              │     │    │
//! │  │   │ SqlitePool    │◄──│ retry on       │   │ 001_vouchers │     │    │
//! │  │   │ Connection    │   │ UNIQUE(code)   │   │              │     │    │
//! │  │   │ Management    │◄──│ Repositories   │   │              │     │    │
//! │  │   └───────────────┘   └────────────────┘   └──────────────┘     │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     SQLite Database                             │    │
//! │  │                  greenpay.db (WAL mode)                         │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`issuance`] - Batch and single issuance with collision retry
//! - [`repository`] - Voucher and batch reads, redemption
//!
//! ## Usage
//!
//! ```rust,ignore
//! use greenpay_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("greenpay.db")).await?;
//!
//! let issued = db.issuer(3).issue_batch(&request).await?;
//! let lookup = db.vouchers().check(&issued.vouchers[0].code).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod issuance;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use issuance::{InsertOutcome, VoucherIssuer, VoucherSink, DEFAULT_MAX_ATTEMPTS};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::batch::BatchRepository;
pub use repository::voucher::VoucherRepository;
