//! Generated gRPC server code for the voucher protocol.
//!
//! This module includes the Rust code generated from
//! `proto/greenpay_voucher.proto`.
//!
//! ## Services Available
//! - `VoucherServiceServer` - Issue, validate, redeem and list vouchers
//! - `HealthServiceServer` - Health checks

// Include the generated code from build.rs
tonic::include_proto!("greenpay.voucher.v1");
