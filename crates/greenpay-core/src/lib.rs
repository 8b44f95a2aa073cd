//! # greenpay-core: Pure Business Logic for GreenPay
//!
//! Voucher rules for the GreenPay exit-fee system, as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GreenPay Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 voucher-api (gRPC, tonic)                       │    │
//! │  │    IssueBatch, IssueVoucher, ValidateVoucher, RedeemVoucher     │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                  greenpay-db (Database Layer)                   │    │
//! │  │        SQLite repositories, issuance with collision retry       │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │             ★ greenpay-core (THIS CRATE) ★                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   types   │  │   money   │  │   code    │  │   batch   │    │    │
//! │  │   │  Voucher  │  │   Money   │  │ generator │  │  planning │    │    │
//! │  │   │   Batch   │  │    GST    │  │  parsing  │  │  drafts   │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Voucher, Batch, requests, summaries)
//! - [`money`] - Money type with integer arithmetic (toea, no floats)
//! - [`code`] - Voucher code generation and parsing
//! - [`batch`] - Turning issuance requests into insertable drafts
//! - [`reconciliation`] - End-of-day cash drawer variance
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use greenpay_core::code::{generate_voucher_code, is_valid_voucher_code};
//! use greenpay_core::money::Money;
//!
//! let code = generate_voucher_code("CORP");
//! assert!(is_valid_voucher_code(&code));
//!
//! let fee = Money::from_toea(5000);
//! assert_eq!(fee.to_string(), "K50.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod batch;
pub mod code;
pub mod error;
pub mod money;
pub mod reconciliation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use batch::{BatchPlan, VoucherDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest number of vouchers a single batch may contain.
///
/// ## Business Reason
/// Corporate clients buy in bulk, but a single request above this size is
/// almost certainly a typo and would hold a write transaction for too long.
pub const MAX_BATCH_QUANTITY: i64 = 10_000;

/// Largest face value of a single voucher: K1,000,000.
///
/// Keeps `amount × MAX_BATCH_QUANTITY` and its GST well inside `i64`.
pub const MAX_AMOUNT_TOEA: i64 = 100_000_000;

/// Default validity of a voucher, counted from `valid_from`.
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// Longest validity a voucher may be issued with (ten years).
pub const MAX_VALIDITY_DAYS: i64 = 3650;

/// Default GST rate in basis points (10%).
pub const DEFAULT_GST_BPS: u32 = 1000;

/// Currency of every amount in the system (Papua New Guinea kina).
pub const CURRENCY: &str = "PGK";
