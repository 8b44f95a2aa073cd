//! # Repository Module
//!
//! Database repository implementations for GreenPay.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  gRPC handler                                                           │
//! │       │                                                                 │
//! │       │  db.vouchers().check("CORP-LK3J2F8Q-8X9QRT")                    │
//! │       ▼                                                                 │
//! │  VoucherRepository                                                      │
//! │  ├── check(&self, code)                                                 │
//! │  ├── redeem(&self, code)                                                │
//! │  ├── list_by_batch(&self, batch_id)                                     │
//! │  └── list_by_company(&self, company, limit)                             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Inserts go through VoucherIssuer (issuance.rs), never a repository.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`voucher::VoucherRepository`] - Voucher lookup, redemption, listings
//! - [`batch::BatchRepository`] - Corporate batch reads

pub mod batch;
pub mod voucher;
