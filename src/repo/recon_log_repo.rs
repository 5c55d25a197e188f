use anyhow::Result;
use sqlx::PgPool;

use crate::domain::transaction::ReconLogInput;

#[derive(Clone)]
pub struct ReconLogRepo {
    pub pool: PgPool,
}

impl ReconLogRepo {
    /// Write-only from the engine's perspective: reconciliation appends one
    /// row per checked transaction and never reads them back.
    pub async fn insert(&self, input: &ReconLogInput) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recon_log (transaction_id, psp_order_id, psp_payment_id, internal_status, external_status, result, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(input.transaction_id)
        .bind(&input.psp_order_id)
        .bind(&input.psp_payment_id)
        .bind(&input.internal_status)
        .bind(&input.external_status)
        .bind(&input.result)
        .bind(&input.details)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
