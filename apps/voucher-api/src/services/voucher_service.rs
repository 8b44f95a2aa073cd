//! Voucher gRPC service implementation.
//!
//! Thin translation between protobuf messages and greenpay-db calls.
//!
//! ```text
//! IssueBatchRequest ──► BatchRequest ──► VoucherIssuer::issue_batch
//!                                              │
//! IssueBatchResponse ◄── summaries + GST ◄─────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tonic::{Request, Response, Status};
use tracing::info;

use greenpay_core::validation::validate_uuid;
use greenpay_core::{
    BatchRequest, Money, PaymentMethod, Voucher, VoucherCategory, VoucherRequest, VoucherStatus,
    VoucherSummary,
};
use greenpay_db::VoucherIssuer;

use crate::error::ApiError;
use crate::proto::{
    voucher_service_server::VoucherService, IssueBatchRequest, IssueBatchResponse,
    IssueVoucherRequest, IssueVoucherResponse, ListBatchVouchersRequest,
    ListBatchVouchersResponse, RedeemVoucherRequest, RedeemVoucherResponse,
    Timestamp as ProtoTimestamp, ValidateVoucherRequest, ValidateVoucherResponse,
    Voucher as ProtoVoucher, VoucherStatus as ProtoVoucherStatus,
    VoucherSummary as ProtoVoucherSummary,
};
use crate::AppState;

// =============================================================================
// Conversions
// =============================================================================

fn to_proto_timestamp(at: DateTime<Utc>) -> ProtoTimestamp {
    ProtoTimestamp {
        value: at.to_rfc3339(),
    }
}

/// Absent or blank timestamps mean "use the default".
fn parse_timestamp(
    field: &str,
    timestamp: Option<ProtoTimestamp>,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    match timestamp {
        Some(ts) if !ts.value.trim().is_empty() => DateTime::parse_from_rfc3339(ts.value.trim())
            .map(|at| Some(at.with_timezone(&Utc)))
            .map_err(|_| {
                ApiError::InvalidRequest(format!("{field} must be an RFC 3339 timestamp"))
            }),
        _ => Ok(None),
    }
}

/// proto3 has no null strings: blank means absent.
fn optional_text(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn to_proto_status(status: VoucherStatus) -> ProtoVoucherStatus {
    match status {
        VoucherStatus::Active => ProtoVoucherStatus::Active,
        VoucherStatus::Used => ProtoVoucherStatus::Used,
        VoucherStatus::Expired => ProtoVoucherStatus::Expired,
    }
}

fn to_proto_summary(summary: VoucherSummary) -> ProtoVoucherSummary {
    ProtoVoucherSummary {
        code: summary.code,
        valid_from: Some(to_proto_timestamp(summary.valid_from)),
        valid_until: Some(to_proto_timestamp(summary.valid_until)),
        amount_toea: summary.amount_toea,
    }
}

fn to_proto_voucher(voucher: Voucher, now: DateTime<Utc>) -> ProtoVoucher {
    let status = voucher.status_at(now);
    let amount_display = voucher.amount().to_string();

    ProtoVoucher {
        id: voucher.id,
        code: voucher.code,
        category: voucher.category.to_string(),
        amount_toea: voucher.amount_toea,
        payment_method: voucher.payment_method.to_string(),
        payment_reference: voucher.payment_reference.unwrap_or_default(),
        batch_id: voucher.batch_id.unwrap_or_default(),
        company_name: voucher.company_name.unwrap_or_default(),
        passport_number: voucher.passport_number.unwrap_or_default(),
        customer_name: voucher.customer_name.unwrap_or_default(),
        valid_from: Some(to_proto_timestamp(voucher.valid_from)),
        valid_until: Some(to_proto_timestamp(voucher.valid_until)),
        used_at: voucher.used_at.map(to_proto_timestamp),
        created_at: Some(to_proto_timestamp(voucher.created_at)),
        status: to_proto_status(status) as i32,
        amount_display,
    }
}

fn batch_request_from_proto(req: IssueBatchRequest) -> Result<BatchRequest, ApiError> {
    Ok(BatchRequest {
        payment_method: req.payment_method.parse::<PaymentMethod>()?,
        valid_from: parse_timestamp("valid_from", req.valid_from)?,
        valid_until: parse_timestamp("valid_until", req.valid_until)?,
        company_name: req.company_name,
        quantity: req.quantity,
        amount_toea: req.amount_toea,
        payment_reference: optional_text(req.payment_reference),
    })
}

fn voucher_request_from_proto(req: IssueVoucherRequest) -> Result<VoucherRequest, ApiError> {
    let category = if req.category.trim().is_empty() {
        VoucherCategory::default()
    } else {
        req.category.parse::<VoucherCategory>()?
    };

    Ok(VoucherRequest {
        category,
        payment_method: req.payment_method.parse::<PaymentMethod>()?,
        valid_from: parse_timestamp("valid_from", req.valid_from)?,
        valid_until: parse_timestamp("valid_until", req.valid_until)?,
        amount_toea: req.amount_toea,
        payment_reference: optional_text(req.payment_reference),
        company_name: optional_text(req.company_name),
        passport_number: optional_text(req.passport_number),
        customer_name: optional_text(req.customer_name),
    })
}

// =============================================================================
// Service
// =============================================================================

/// Voucher service implementation.
pub struct VoucherServiceImpl {
    state: Arc<AppState>,
}

impl VoucherServiceImpl {
    /// Create a new voucher service.
    pub fn new(state: Arc<AppState>) -> Self {
        VoucherServiceImpl { state }
    }

    fn issuer(&self) -> VoucherIssuer {
        self.state
            .db
            .issuer(self.state.config.issue_max_attempts)
            .validity_days(self.state.config.default_validity_days)
    }
}

#[tonic::async_trait]
impl VoucherService for VoucherServiceImpl {
    /// Issue a corporate batch.
    async fn issue_batch(
        &self,
        request: Request<IssueBatchRequest>,
    ) -> Result<Response<IssueBatchResponse>, Status> {
        let batch_request = batch_request_from_proto(request.into_inner())?;

        info!(
            company = %batch_request.company_name,
            quantity = batch_request.quantity,
            "Issuing voucher batch"
        );

        let issued = self
            .issuer()
            .issue_batch(&batch_request)
            .await
            .map_err(ApiError::from)?;

        let totals = issued.batch.totals(self.state.config.gst_rate());

        Ok(Response::new(IssueBatchResponse {
            batch_id: issued.batch.id,
            company_name: issued.batch.company_name,
            quantity: issued.batch.quantity,
            vouchers: issued.vouchers.into_iter().map(to_proto_summary).collect(),
            subtotal_toea: totals.subtotal.toea(),
            gst_toea: totals.gst.toea(),
            total_toea: totals.total.toea(),
            total_display: totals.total.to_string(),
        }))
    }

    /// Issue a single voucher.
    async fn issue_voucher(
        &self,
        request: Request<IssueVoucherRequest>,
    ) -> Result<Response<IssueVoucherResponse>, Status> {
        let voucher_request = voucher_request_from_proto(request.into_inner())?;

        let voucher = self
            .issuer()
            .issue_voucher(&voucher_request)
            .await
            .map_err(ApiError::from)?;

        Ok(Response::new(IssueVoucherResponse {
            voucher: Some(to_proto_voucher(voucher, Utc::now())),
        }))
    }

    /// Look up a voucher without changing it.
    async fn validate_voucher(
        &self,
        request: Request<ValidateVoucherRequest>,
    ) -> Result<Response<ValidateVoucherResponse>, Status> {
        let req = request.into_inner();
        let now = Utc::now();

        let lookup = self
            .state
            .db
            .vouchers()
            .check_at(&req.code, now)
            .await
            .map_err(ApiError::from)?;

        let message = match lookup.status {
            VoucherStatus::Active => format!(
                "Valid voucher for {}",
                Money::from_toea(lookup.voucher.amount_toea)
            ),
            VoucherStatus::Used => match lookup.voucher.used_at {
                Some(used_at) => format!("Already used on {}", used_at.format("%Y-%m-%d")),
                None => "Already used".to_string(),
            },
            VoucherStatus::Expired => format!(
                "Expired on {}",
                lookup.voucher.valid_until.format("%Y-%m-%d")
            ),
        };

        Ok(Response::new(ValidateVoucherResponse {
            valid: lookup.status == VoucherStatus::Active,
            status: to_proto_status(lookup.status) as i32,
            voucher: Some(to_proto_voucher(lookup.voucher, now)),
            message,
        }))
    }

    /// Mark an active voucher as used.
    async fn redeem_voucher(
        &self,
        request: Request<RedeemVoucherRequest>,
    ) -> Result<Response<RedeemVoucherResponse>, Status> {
        let req = request.into_inner();
        let now = Utc::now();

        let voucher = self
            .state
            .db
            .vouchers()
            .redeem_at(&req.code, now)
            .await
            .map_err(ApiError::from)?;

        Ok(Response::new(RedeemVoucherResponse {
            voucher: Some(to_proto_voucher(voucher, now)),
        }))
    }

    /// List the vouchers of one batch.
    async fn list_batch_vouchers(
        &self,
        request: Request<ListBatchVouchersRequest>,
    ) -> Result<Response<ListBatchVouchersResponse>, Status> {
        let req = request.into_inner();
        validate_uuid(&req.batch_id).map_err(ApiError::from)?;

        let db = &self.state.db;
        if db
            .batches()
            .get_by_id(&req.batch_id)
            .await
            .map_err(ApiError::from)?
            .is_none()
        {
            return Err(ApiError::NotFound(format!("Batch {}", req.batch_id)).into());
        }

        let now = Utc::now();
        let vouchers = db
            .vouchers()
            .list_by_batch(&req.batch_id)
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .map(|v| to_proto_voucher(v, now))
            .collect();

        Ok(Response::new(ListBatchVouchersResponse { vouchers }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
