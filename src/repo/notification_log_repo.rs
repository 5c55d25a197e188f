use anyhow::Result;
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct NotificationLogRepo {
    pub pool: PgPool,
}

pub struct NotificationLogInput<'a> {
    pub recovery_attempt_id: i64,
    pub channel: &'a str,
    pub recipient: &'a str,
    pub provider: &'a str,
}

impl NotificationLogRepo {
    /// One append-only row per dispatch attempt.
    pub async fn record_sent(
        &self,
        input: NotificationLogInput<'_>,
        provider_message_id: Option<&str>,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO notification_log (recovery_attempt_id, channel, recipient, status, provider, provider_message_id, sent_at)
            VALUES ($1, $2, $3, 'sent', $4, $5, now())
            RETURNING id
            "#,
        )
        .bind(input.recovery_attempt_id)
        .bind(input.channel)
        .bind(input.recipient)
        .bind(input.provider)
        .bind(provider_message_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }

    pub async fn record_failed(
        &self,
        input: NotificationLogInput<'_>,
        error_message: &str,
    ) -> Result<i64> {
        let truncated: String = error_message.chars().take(512).collect();
        let row = sqlx::query(
            r#"
            INSERT INTO notification_log (recovery_attempt_id, channel, recipient, status, provider, error_message, failed_at)
            VALUES ($1, $2, $3, 'failed', $4, $5, now())
            RETURNING id
            "#,
        )
        .bind(input.recovery_attempt_id)
        .bind(input.channel)
        .bind(input.recipient)
        .bind(input.provider)
        .bind(truncated)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }
}
