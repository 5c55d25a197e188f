use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::transaction::FailureEventRow;

#[derive(Clone)]
pub struct FailureEventsRepo {
    pub pool: PgPool,
}

fn row_to_event(r: sqlx::postgres::PgRow) -> FailureEventRow {
    FailureEventRow {
        id: r.get("id"),
        transaction_id: r.get("transaction_id"),
        gateway: r.get("gateway"),
        code: r.get("code"),
        reason: r.get("reason"),
        meta: r.get("meta"),
        occurred_at: r.get("occurred_at"),
        created_at: r.get("created_at"),
    }
}

impl FailureEventsRepo {
    /// Append-only: failure events are an audit trail and never mutated.
    pub async fn insert(
        &self,
        transaction_id: i64,
        gateway: Option<&str>,
        code: Option<&str>,
        reason: &str,
        meta: Option<serde_json::Value>,
        occurred_at: Option<DateTime<Utc>>,
    ) -> Result<FailureEventRow> {
        let row = sqlx::query(
            r#"
            INSERT INTO failure_events (transaction_id, gateway, code, reason, meta, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, transaction_id, gateway, code, reason, meta, occurred_at, created_at
            "#,
        )
        .bind(transaction_id)
        .bind(gateway)
        .bind(code)
        .bind(reason)
        .bind(meta)
        .bind(occurred_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row_to_event(row))
    }

    pub async fn list_for_transaction(&self, transaction_id: i64) -> Result<Vec<FailureEventRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, transaction_id, gateway, code, reason, meta, occurred_at, created_at
            FROM failure_events
            WHERE transaction_id=$1
            ORDER BY id DESC
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_event).collect())
    }

    /// Reconciliation's internal-status heuristic: a `payment_succeeded`
    /// reason row means we believe the transaction was paid. Inherited from
    /// the event log design; see DESIGN.md.
    pub async fn has_success_event(&self, transaction_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 AS one FROM failure_events WHERE transaction_id=$1 AND reason='payment_succeeded' LIMIT 1",
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}
