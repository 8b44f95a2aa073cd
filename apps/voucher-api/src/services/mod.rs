//! gRPC service implementations.
//!
//! This module contains all the gRPC service implementations for the Voucher API.

pub mod health_service;
pub mod voucher_service;
