use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::attempt::{AttemptRow, AttemptStatus, Channel};

#[derive(Clone)]
pub struct AttemptsRepo {
    pub pool: PgPool,
}

const COLUMNS: &str = "id, transaction_id, transaction_ref, channel, token, status, expires_at, retry_count, max_retries, last_retry_at, next_retry_at, opened_at, used_at, created_at";

fn row_to_attempt(r: sqlx::postgres::PgRow) -> Result<AttemptRow> {
    let status: String = r.get("status");
    let channel: String = r.get("channel");
    Ok(AttemptRow {
        id: r.get("id"),
        transaction_id: r.get("transaction_id"),
        transaction_ref: r.get("transaction_ref"),
        channel: Channel::parse(&channel).ok_or_else(|| anyhow!("unknown channel {channel}"))?,
        token: r.get("token"),
        status: AttemptStatus::parse(&status).ok_or_else(|| anyhow!("unknown status {status}"))?,
        expires_at: r.get("expires_at"),
        retry_count: r.get("retry_count"),
        max_retries: r.get("max_retries"),
        last_retry_at: r.get("last_retry_at"),
        next_retry_at: r.get("next_retry_at"),
        opened_at: r.get("opened_at"),
        used_at: r.get("used_at"),
        created_at: r.get("created_at"),
    })
}

impl AttemptsRepo {
    pub async fn insert(
        &self,
        transaction_id: i64,
        transaction_ref: &str,
        channel: Channel,
        token: &str,
        expires_at: DateTime<Utc>,
        max_retries: i32,
    ) -> Result<AttemptRow> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO recovery_attempts (transaction_id, transaction_ref, channel, token, status, expires_at, max_retries)
            VALUES ($1, $2, $3, $4, 'created', $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(transaction_id)
        .bind(transaction_ref)
        .bind(channel.as_str())
        .bind(token)
        .bind(expires_at)
        .bind(max_retries)
        .fetch_one(&self.pool)
        .await?;
        row_to_attempt(row)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<AttemptRow>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM recovery_attempts WHERE token=$1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_attempt).transpose()
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<AttemptRow>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM recovery_attempts WHERE id=$1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_attempt).transpose()
    }

    pub async fn list_for_transaction(&self, transaction_id: i64) -> Result<Vec<AttemptRow>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM recovery_attempts WHERE transaction_id=$1 ORDER BY id DESC"
        ))
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_attempt).collect()
    }

    /// Most recent attempt for a transaction that a webhook may still
    /// complete. Matches by id or by denormalized ref for resilience.
    pub async fn latest_active_for_transaction(
        &self,
        transaction_id: i64,
        transaction_ref: &str,
    ) -> Result<Option<AttemptRow>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS} FROM recovery_attempts
            WHERE (transaction_id=$1 OR transaction_ref=$2)
              AND status IN ('created','sent','opened')
            ORDER BY id DESC
            LIMIT 1
            "#
        ))
        .bind(transaction_id)
        .bind(transaction_ref)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_attempt).transpose()
    }

    /// Conditional status advance. The WHERE clause carries the legal source
    /// states, so concurrent workers race harmlessly: exactly one write wins
    /// and the rest see zero rows. Returns the updated row when this call was
    /// the winner.
    async fn advance(
        &self,
        id: i64,
        set_clause: &str,
        from: &[AttemptStatus],
    ) -> Result<Option<AttemptRow>> {
        let states: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let row = sqlx::query(&format!(
            "UPDATE recovery_attempts SET {set_clause} WHERE id=$1 AND status = ANY($2) RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&states)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_attempt).transpose()
    }

    pub async fn mark_sent(&self, id: i64) -> Result<Option<AttemptRow>> {
        self.advance(
            id,
            "status='sent'",
            &[AttemptStatus::Created, AttemptStatus::Sent],
        )
        .await
    }

    pub async fn mark_opened(&self, id: i64) -> Result<Option<AttemptRow>> {
        self.advance(
            id,
            "status='opened', opened_at=now()",
            &[AttemptStatus::Created, AttemptStatus::Sent],
        )
        .await
    }

    pub async fn complete(&self, id: i64) -> Result<Option<AttemptRow>> {
        self.advance(
            id,
            "status='completed', used_at=now(), next_retry_at=NULL",
            &[AttemptStatus::Created, AttemptStatus::Sent, AttemptStatus::Opened],
        )
        .await
    }

    pub async fn cancel(&self, id: i64) -> Result<Option<AttemptRow>> {
        self.advance(
            id,
            "status='cancelled', next_retry_at=NULL",
            &[AttemptStatus::Created, AttemptStatus::Sent, AttemptStatus::Opened],
        )
        .await
    }

    pub async fn expire(&self, id: i64) -> Result<Option<AttemptRow>> {
        self.advance(
            id,
            "status='expired', next_retry_at=NULL",
            &[AttemptStatus::Created, AttemptStatus::Sent, AttemptStatus::Opened],
        )
        .await
    }

    /// A retry slot is consumed when the dispatch is attempted, before the
    /// transport confirms delivery. Intentional; see DESIGN.md.
    pub async fn consume_retry_slot(&self, id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE recovery_attempts SET retry_count=retry_count+1, last_retry_at=now() WHERE id=$1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_next_retry_at(&self, id: i64, at: Option<DateTime<Utc>>) -> Result<()> {
        sqlx::query("UPDATE recovery_attempts SET next_retry_at=$2 WHERE id=$1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Attempts due for a notification retry right now. Only non-terminal,
    /// unexpired attempts with remaining budget are eligible.
    pub async fn due_for_retry(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<AttemptRow>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS} FROM recovery_attempts
            WHERE status IN ('created','sent')
              AND next_retry_at IS NOT NULL AND next_retry_at <= $1
              AND retry_count < max_retries
              AND expires_at > $1
            ORDER BY next_retry_at ASC
            LIMIT $2
            "#
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_attempt).collect()
    }

    /// Bulk expiry sweep; returns the number of attempts flipped.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE recovery_attempts
            SET status='expired', next_retry_at=NULL
            WHERE expires_at < $1 AND status IN ('created','sent','opened')
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
