//! # Voucher Repository
//!
//! Lookup, redemption and listings for issued vouchers. Issuance lives in
//! [`crate::issuance`] because it needs the collision retry loop.
//!
//! ## Voucher Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Voucher Lifecycle                                 │
//! │                                                                         │
//! │  1. ISSUE (VoucherIssuer)                                               │
//! │     └── row inserted, used_at = NULL          status: Active            │
//! │                                                                         │
//! │  2. CHECK (gate agent scans code)                                       │
//! │     └── check() → VoucherLookup { voucher, status }                     │
//! │                                                                         │
//! │  3. REDEEM                                                              │
//! │     └── redeem() → used_at = now              status: Used              │
//! │                                                                         │
//! │  (valid_until passes without redemption)      status: Expired           │
//! │                                                                         │
//! │  Rows are never deleted. Status is derived, never stored.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use greenpay_core::validation::validate_voucher_code;
use greenpay_core::{CoreError, Voucher, VoucherLookup, VoucherStatus};

/// Columns selected for every `Voucher` read.
const SELECT_VOUCHER: &str = r#"
    SELECT
        id, code, category, amount_toea, payment_method, payment_reference,
        batch_id, company_name, passport_number, customer_name,
        valid_from, valid_until, used_at, created_at
    FROM vouchers
"#;

/// Fetches one voucher by exact code on any executor (pool or transaction).
async fn fetch_by_code<'e, E>(executor: E, code: &str) -> DbResult<Option<Voucher>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("{SELECT_VOUCHER} WHERE code = ?1");
    let voucher = sqlx::query_as::<_, Voucher>(&sql)
        .bind(code)
        .fetch_optional(executor)
        .await?;

    Ok(voucher)
}

/// Repository for voucher database operations.
#[derive(Debug, Clone)]
pub struct VoucherRepository {
    pool: SqlitePool,
}

impl VoucherRepository {
    /// Creates a new VoucherRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VoucherRepository { pool }
    }

    /// Gets a voucher by its exact (already normalised) code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Voucher>> {
        fetch_by_code(&self.pool, code).await
    }

    /// Gets a voucher by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Voucher>> {
        let sql = format!("{SELECT_VOUCHER} WHERE id = ?1");
        let voucher = sqlx::query_as::<_, Voucher>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(voucher)
    }

    /// Looks up user-entered code input and reports its current status.
    pub async fn check(&self, input: &str) -> DbResult<VoucherLookup> {
        self.check_at(input, Utc::now()).await
    }

    /// [`check`](Self::check) with an explicit clock.
    ///
    /// ## Errors
    /// - `Validation` for blank or malformed input
    /// - `VoucherNotFound` when no voucher carries the code
    pub async fn check_at(&self, input: &str, now: DateTime<Utc>) -> DbResult<VoucherLookup> {
        let code = validate_voucher_code(input).map_err(CoreError::from)?;

        let voucher = self
            .get_by_code(&code)
            .await?
            .ok_or(CoreError::VoucherNotFound(code))?;

        let status = voucher.status_at(now);
        debug!(code = %voucher.code, status = %status, "Voucher checked");

        Ok(VoucherLookup { voucher, status })
    }

    /// Marks an active voucher as used.
    pub async fn redeem(&self, input: &str) -> DbResult<Voucher> {
        self.redeem_at(input, Utc::now()).await
    }

    /// [`redeem`](Self::redeem) with an explicit clock.
    ///
    /// ## Flow
    /// ```text
    /// BEGIN
    ///   load voucher by code ── none ──► VoucherNotFound
    ///   used_at set?         ── yes ──► VoucherAlreadyUsed
    ///   now > valid_until?   ── yes ──► VoucherExpired
    ///   UPDATE ... SET used_at = now WHERE id = ? AND used_at IS NULL
    ///   0 rows?              ── yes ──► VoucherAlreadyUsed (lost a race)
    /// COMMIT
    /// ```
    pub async fn redeem_at(&self, input: &str, now: DateTime<Utc>) -> DbResult<Voucher> {
        let code = validate_voucher_code(input).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let mut voucher = fetch_by_code(&mut *tx, &code)
            .await?
            .ok_or_else(|| CoreError::VoucherNotFound(code.clone()))?;

        if let Some(used_at) = voucher.used_at {
            warn!(code = %code, %used_at, "Redemption of used voucher refused");
            return Err(CoreError::VoucherAlreadyUsed { code, used_at }.into());
        }

        if voucher.status_at(now) == VoucherStatus::Expired {
            warn!(code = %code, valid_until = %voucher.valid_until, "Redemption of expired voucher refused");
            return Err(CoreError::VoucherExpired {
                code,
                valid_until: voucher.valid_until,
            }
            .into());
        }

        let result = sqlx::query("UPDATE vouchers SET used_at = ?1 WHERE id = ?2 AND used_at IS NULL")
            .bind(now)
            .bind(&voucher.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            let used_at: Option<DateTime<Utc>> =
                sqlx::query_scalar("SELECT used_at FROM vouchers WHERE id = ?1")
                    .bind(&voucher.id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(CoreError::VoucherAlreadyUsed {
                code,
                used_at: used_at.unwrap_or(now),
            }
            .into());
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        voucher.used_at = Some(now);
        info!(code = %voucher.code, "Voucher redeemed");

        Ok(voucher)
    }

    /// Lists the vouchers of one batch in insertion order.
    pub async fn list_by_batch(&self, batch_id: &str) -> DbResult<Vec<Voucher>> {
        let sql = format!("{SELECT_VOUCHER} WHERE batch_id = ?1 ORDER BY rowid");
        let vouchers = sqlx::query_as::<_, Voucher>(&sql)
            .bind(batch_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(vouchers)
    }

    /// Lists the most recent vouchers issued to a company.
    pub async fn list_by_company(&self, company_name: &str, limit: u32) -> DbResult<Vec<Voucher>> {
        let sql = format!(
            "{SELECT_VOUCHER} WHERE company_name = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        );
        let vouchers = sqlx::query_as::<_, Voucher>(&sql)
            .bind(company_name.trim())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(vouchers)
    }

    /// Total number of vouchers ever issued.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vouchers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use greenpay_core::code::generate_voucher_code;
    use greenpay_core::{BatchRequest, PaymentMethod, VoucherCategory, VoucherRequest};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
    }

    fn online_request() -> VoucherRequest {
        VoucherRequest {
            category: VoucherCategory::Online,
            amount_toea: 5000,
            payment_method: PaymentMethod::Online,
            payment_reference: Some("TXN-1".to_string()),
            company_name: None,
            passport_number: Some("P1234567".to_string()),
            customer_name: None,
            valid_from: None,
            valid_until: None,
        }
    }

    async fn setup() -> (Database, Voucher) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let voucher = db
            .issuer(3)
            .issue_voucher_with(&online_request(), now(), generate_voucher_code)
            .await
            .unwrap();
        (db, voucher)
    }

    #[tokio::test]
    async fn test_check_reports_status() {
        let (db, voucher) = setup().await;
        let repo = db.vouchers();

        let lookup = repo
            .check_at(&voucher.code.to_lowercase(), now())
            .await
            .unwrap();
        assert_eq!(lookup.voucher, voucher);
        assert_eq!(lookup.status, VoucherStatus::Active);

        let later = voucher.valid_until + Duration::seconds(1);
        let lookup = repo.check_at(&voucher.code, later).await.unwrap();
        assert_eq!(lookup.status, VoucherStatus::Expired);
    }

    #[tokio::test]
    async fn test_check_unknown_and_blank_codes() {
        let (db, _) = setup().await;
        let repo = db.vouchers();

        let err = repo.check_at("VCH-0-AAAAAA", now()).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::VoucherNotFound(_))));

        let err = repo.check_at("   ", now()).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_redeem_once() {
        let (db, voucher) = setup().await;
        let repo = db.vouchers();
        let at = now() + Duration::hours(2);

        let redeemed = repo.redeem_at(&voucher.code, at).await.unwrap();
        assert_eq!(redeemed.used_at, Some(at));

        let lookup = repo.check_at(&voucher.code, at).await.unwrap();
        assert_eq!(lookup.status, VoucherStatus::Used);
        assert_eq!(lookup.voucher.used_at, Some(at));

        let err = repo.redeem_at(&voucher.code, at).await.unwrap_err();
        match err {
            DbError::Domain(CoreError::VoucherAlreadyUsed { used_at, .. }) => {
                assert_eq!(used_at, at)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_redeem_expired_voucher_is_refused() {
        let (db, voucher) = setup().await;
        let repo = db.vouchers();

        let err = repo
            .redeem_at(&voucher.code, voucher.valid_until + Duration::days(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::VoucherExpired { .. })));

        let stored = repo.get_by_code(&voucher.code).await.unwrap().unwrap();
        assert_eq!(stored.used_at, None);
    }

    #[tokio::test]
    async fn test_get_by_id_and_count() {
        let (db, voucher) = setup().await;
        let repo = db.vouchers();

        assert_eq!(repo.get_by_id(&voucher.id).await.unwrap(), Some(voucher));
        assert_eq!(repo.get_by_id("missing").await.unwrap(), None);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_by_batch_and_company() {
        let (db, _) = setup().await;
        let request = BatchRequest {
            company_name: "Acme".to_string(),
            quantity: 4,
            amount_toea: 5000,
            payment_method: PaymentMethod::BankTransfer,
            payment_reference: None,
            valid_from: None,
            valid_until: None,
        };
        let issued = db
            .issuer(3)
            .issue_batch_with(&request, now(), generate_voucher_code)
            .await
            .unwrap();
        let repo = db.vouchers();

        let listed = repo.list_by_batch(&issued.batch.id).await.unwrap();
        let codes: Vec<_> = listed.iter().map(|v| v.code.clone()).collect();
        let issued_codes: Vec<_> = issued.vouchers.iter().map(|v| v.code.clone()).collect();
        assert_eq!(codes, issued_codes);

        assert_eq!(repo.list_by_company(" Acme ", 10).await.unwrap().len(), 4);
        assert_eq!(repo.list_by_company("Acme", 2).await.unwrap().len(), 2);
        assert!(repo.list_by_company("Globex", 10).await.unwrap().is_empty());
    }
}
