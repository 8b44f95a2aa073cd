//! # Batch Repository
//!
//! Reads for corporate batches. Batch rows are written only by
//! [`crate::issuance::VoucherIssuer`], inside the same transaction as their
//! vouchers.

use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use greenpay_core::Batch;

/// Inserts the batch row on any executor (normally the issuance transaction).
pub(crate) async fn insert_batch<'e, E>(executor: E, batch: &Batch) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    debug!(id = %batch.id, company = %batch.company_name, quantity = batch.quantity, "Inserting batch");

    sqlx::query(
        r#"
        INSERT INTO batches (
            id, company_name, quantity, amount_toea,
            payment_method, payment_reference,
            valid_from, valid_until, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&batch.id)
    .bind(&batch.company_name)
    .bind(batch.quantity)
    .bind(batch.amount_toea)
    .bind(batch.payment_method)
    .bind(&batch.payment_reference)
    .bind(batch.valid_from)
    .bind(batch.valid_until)
    .bind(batch.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Repository for batch database operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Gets a batch by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(
            r#"
            SELECT
                id, company_name, quantity, amount_toea,
                payment_method, payment_reference,
                valid_from, valid_until, created_at
            FROM batches
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    /// Lists the most recently issued batches, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(
            r#"
            SELECT
                id, company_name, quantity, amount_toea,
                payment_method, payment_reference,
                valid_from, valid_until, created_at
            FROM batches
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    /// Number of batches issued.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM batches")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone, Utc};
    use greenpay_core::code::generate_voucher_code;
    use greenpay_core::{BatchRequest, PaymentMethod};

    fn request(company: &str) -> BatchRequest {
        BatchRequest {
            company_name: company.to_string(),
            quantity: 2,
            amount_toea: 5000,
            payment_method: PaymentMethod::BankTransfer,
            payment_reference: None,
            valid_from: None,
            valid_until: None,
        }
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let issuer = db.issuer(3);
        let t0 = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();

        let first = issuer
            .issue_batch_with(&request("Acme"), t0, generate_voucher_code)
            .await
            .unwrap();
        let second = issuer
            .issue_batch_with(&request("Ok Tedi"), t0 + Duration::minutes(5), generate_voucher_code)
            .await
            .unwrap();

        let recent = db.batches().list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, second.batch.id);
        assert_eq!(recent[1].id, first.batch.id);

        assert_eq!(db.batches().list_recent(1).await.unwrap().len(), 1);
        assert_eq!(db.batches().count().await.unwrap(), 2);

        let stored = db.batches().get_by_id(&first.batch.id).await.unwrap();
        assert_eq!(stored, Some(first.batch));
        assert_eq!(db.batches().get_by_id("missing").await.unwrap(), None);
    }
}
