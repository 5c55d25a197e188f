use anyhow::Result;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PspEventsRepo {
    pub pool: PgPool,
}

impl PspEventsRepo {
    /// Records the deterministic identity of an inbound processor event.
    /// Returns false when the ledger already holds the key, i.e. the event is
    /// a duplicate delivery. Dedup rides on the table's unique constraint, not
    /// an in-process check, so concurrent workers racing on the same
    /// redelivery resolve at the store: exactly one insert wins.
    pub async fn record_once(
        &self,
        provider: &str,
        event_type: &str,
        external_id: &str,
        payload: &serde_json::Value,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO psp_events (provider, event_type, external_id, payload)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (provider, event_type, external_id) DO NOTHING
            "#,
        )
        .bind(provider)
        .bind(event_type)
        .bind(external_id)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
