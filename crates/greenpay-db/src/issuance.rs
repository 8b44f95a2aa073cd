//! # Voucher Issuance
//!
//! Persists planned vouchers so that every stored code is unique, retrying
//! with fresh codes when the database reports a collision.
//!
//! ## Batch Issuance Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    issue_batch(request)                                 │
//! │                                                                         │
//! │  BatchPlan::new ──► InvalidQuantity / Validation (nothing touched)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ─► INSERT batches                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────── attempt 1..=max_attempts ─────────────┐                  │
//! │  │  sink.insert_vouchers(remaining)                  │                  │
//! │  │     ├── all stored ─────────────────────────────► COMMIT ─► N rows   │
//! │  │     ├── UNIQUE(code) hit after k rows             │                  │
//! │  │     │     drop first k from remaining             │                  │
//! │  │     │     regenerate codes for the rest ──► loop  │                  │
//! │  │     └── any other error ──────────────────────────► ROLLBACK         │
//! │  └───────────────────────────────────────────────────┘                  │
//! │       │ attempts used up                                                │
//! │       ▼                                                                 │
//! │  RetryExhausted ─► ROLLBACK ─► zero rows from this request              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Collisions are expected to be vanishingly rare (timestamp plus 36^6
//! random suffixes), so the attempt bound is a safety net only.

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::batch::insert_batch;
use greenpay_core::batch::plan_voucher;
use greenpay_core::code::generate_voucher_code;
use greenpay_core::{
    BatchPlan, BatchRequest, IssuedBatch, Voucher, VoucherDraft, VoucherRequest,
    DEFAULT_VALIDITY_DAYS,
};

/// Insert attempts before giving up on a request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Rows per multi-row `INSERT`. 500 rows × 13 columns stays well under
/// SQLite's bound-parameter limit.
pub const INSERT_CHUNK_SIZE: usize = 500;

// =============================================================================
// Sink
// =============================================================================

/// Result of one insert attempt.
///
/// `inserted` always holds a prefix of the rows passed in, in order. When
/// `collision` is set, the rows after that prefix were not stored.
#[derive(Debug, Default)]
pub struct InsertOutcome {
    pub inserted: Vec<Voucher>,
    pub collision: Option<DbError>,
}

/// Where vouchers are written.
///
/// The SQLite implementation writes through an open transaction; tests use
/// in-memory fakes to force collisions deterministically.
pub trait VoucherSink {
    /// Stores `rows` in order, stopping at the first uniqueness violation.
    ///
    /// A uniqueness violation is reported through
    /// [`InsertOutcome::collision`]; every other failure is an `Err`.
    fn insert_vouchers(
        &mut self,
        rows: &[VoucherDraft],
    ) -> impl Future<Output = DbResult<InsertOutcome>> + Send;
}

impl VoucherSink for Transaction<'_, Sqlite> {
    async fn insert_vouchers(&mut self, rows: &[VoucherDraft]) -> DbResult<InsertOutcome> {
        let mut outcome = InsertOutcome::default();

        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO vouchers (\
                    id, code, category, amount_toea, payment_method, payment_reference, \
                    batch_id, company_name, passport_number, customer_name, \
                    valid_from, valid_until, created_at\
                ) ",
            );
            builder.push_values(chunk, |mut row, draft| {
                row.push_bind(draft.id.as_str())
                    .push_bind(draft.code.as_str())
                    .push_bind(draft.category)
                    .push_bind(draft.amount_toea)
                    .push_bind(draft.payment_method)
                    .push_bind(draft.payment_reference.as_deref())
                    .push_bind(draft.batch_id.as_deref())
                    .push_bind(draft.company_name.as_deref())
                    .push_bind(draft.passport_number.as_deref())
                    .push_bind(draft.customer_name.as_deref())
                    .push_bind(draft.valid_from)
                    .push_bind(draft.valid_until)
                    .push_bind(draft.created_at);
            });

            // A failed statement leaves none of its rows behind
            match builder.build().execute(&mut **self).await {
                Ok(_) => outcome
                    .inserted
                    .extend(chunk.iter().map(VoucherDraft::to_voucher)),
                Err(err) => {
                    let err = DbError::from(err);
                    if err.is_unique_violation() {
                        outcome.collision = Some(err);
                        break;
                    }
                    return Err(err);
                }
            }
        }

        Ok(outcome)
    }
}

// =============================================================================
// Retry Loop
// =============================================================================

/// Inserts `drafts` through `sink`, regenerating codes after a collision.
///
/// After a collision the rows already stored are kept and the **whole**
/// remainder gets fresh codes from `regenerate`, even the rows whose codes
/// were never checked.
///
/// ## Returns
/// * `Ok(vouchers)` - exactly `drafts.len()` vouchers, in order
/// * `Err(RetryExhausted)` - collisions on every one of `max_attempts` tries
/// * `Err(_)` - any non-uniqueness failure, immediately
pub async fn insert_with_retry<S, G>(
    sink: &mut S,
    mut drafts: Vec<VoucherDraft>,
    max_attempts: u32,
    mut regenerate: G,
) -> DbResult<Vec<Voucher>>
where
    S: VoucherSink + Send,
    G: FnMut(&str) -> String + Send,
{
    let requested = drafts.len();
    let max_attempts = max_attempts.max(1);
    let mut persisted: Vec<Voucher> = Vec::with_capacity(requested);

    for attempt in 1..=max_attempts {
        let outcome = sink.insert_vouchers(&drafts).await?;
        let stored = outcome.inserted.len();
        persisted.extend(outcome.inserted);

        let Some(collision) = outcome.collision else {
            if persisted.len() != requested {
                return Err(DbError::Internal(format!(
                    "sink stored {} of {} vouchers without reporting a failure",
                    persisted.len(),
                    requested
                )));
            }
            debug!(attempt, count = requested, "Vouchers stored");
            return Ok(persisted);
        };

        drafts.drain(..stored.min(drafts.len()));
        warn!(
            attempt,
            max_attempts,
            remaining = drafts.len(),
            error = %collision,
            "Voucher code collision, regenerating remaining codes"
        );
        for draft in &mut drafts {
            draft.code = regenerate(draft.prefix());
        }
    }

    Err(DbError::RetryExhausted {
        attempts: max_attempts,
        persisted: persisted.len(),
        requested,
    })
}

// =============================================================================
// Issuer
// =============================================================================

/// Issues batches and single vouchers against the database.
///
/// ## Usage
/// ```rust,ignore
/// let issued = db.issuer(3).issue_batch(&BatchRequest {
///     company_name: "Acme".into(),
///     quantity: 3,
///     amount_toea: 5000,
///     ..
/// }).await?;
/// assert_eq!(issued.vouchers.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct VoucherIssuer {
    pool: SqlitePool,
    max_attempts: u32,
    validity_days: i64,
}

impl VoucherIssuer {
    /// Creates an issuer. `max_attempts` below 1 is treated as 1.
    pub fn new(pool: SqlitePool, max_attempts: u32) -> Self {
        VoucherIssuer {
            pool,
            max_attempts: max_attempts.max(1),
            validity_days: DEFAULT_VALIDITY_DAYS,
        }
    }

    /// Sets the validity used when a request has no `valid_until`.
    pub fn validity_days(mut self, days: i64) -> Self {
        self.validity_days = days;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Issues a corporate batch of `request.quantity` vouchers.
    pub async fn issue_batch(&self, request: &BatchRequest) -> DbResult<IssuedBatch> {
        self.issue_batch_with(request, Utc::now(), generate_voucher_code)
            .await
    }

    /// [`issue_batch`](Self::issue_batch) with an explicit clock and code
    /// generator.
    ///
    /// ## Errors
    /// - `Domain(InvalidQuantity)` / `Domain(Validation)` before any write
    /// - `RetryExhausted` when collisions persist; nothing is stored
    pub async fn issue_batch_with<G>(
        &self,
        request: &BatchRequest,
        now: DateTime<Utc>,
        mut generate: G,
    ) -> DbResult<IssuedBatch>
    where
        G: FnMut(&str) -> String + Send,
    {
        let BatchPlan { batch, drafts } =
            BatchPlan::new(request, now, self.validity_days, &mut generate)?;

        let mut tx = self.pool.begin().await?;
        insert_batch(&mut *tx, &batch).await?;
        let vouchers = insert_with_retry(&mut tx, drafts, self.max_attempts, &mut generate).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            batch_id = %batch.id,
            company = %batch.company_name,
            quantity = batch.quantity,
            "Batch issued"
        );

        Ok(IssuedBatch {
            vouchers: vouchers.iter().map(Voucher::summary).collect(),
            batch,
        })
    }

    /// Issues one voucher (counter or online purchase).
    pub async fn issue_voucher(&self, request: &VoucherRequest) -> DbResult<Voucher> {
        self.issue_voucher_with(request, Utc::now(), generate_voucher_code)
            .await
    }

    /// [`issue_voucher`](Self::issue_voucher) with an explicit clock and code
    /// generator.
    pub async fn issue_voucher_with<G>(
        &self,
        request: &VoucherRequest,
        now: DateTime<Utc>,
        mut generate: G,
    ) -> DbResult<Voucher>
    where
        G: FnMut(&str) -> String + Send,
    {
        let draft = plan_voucher(request, now, self.validity_days, &mut generate)?;

        let mut tx = self.pool.begin().await?;
        let mut stored =
            insert_with_retry(&mut tx, vec![draft], self.max_attempts, &mut generate).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let voucher = stored
            .pop()
            .ok_or_else(|| DbError::Internal("voucher missing after insert".to_string()))?;
        info!(code = %voucher.code, category = %voucher.category, "Voucher issued");

        Ok(voucher)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
