use anyhow::Result;
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct RetryPolicyRepo {
    pub pool: PgPool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RetryPolicy {
    pub org_id: i64,
    pub name: String,
    pub max_retries: i32,
    pub initial_delay_minutes: i32,
    pub backoff_multiplier: f64,
    pub max_delay_minutes: i32,
    pub enabled_channels: Vec<String>,
    pub is_active: bool,
}

/// Built-in conservative default used when an organization has no active
/// policy: 3 retries, 60-minute initial delay, x2 backoff, 24-hour cap.
pub fn default_policy(org_id: i64) -> RetryPolicy {
    RetryPolicy {
        org_id,
        name: "Default Policy".to_string(),
        max_retries: 3,
        initial_delay_minutes: 60,
        backoff_multiplier: 2.0,
        max_delay_minutes: 1440,
        enabled_channels: vec!["email".to_string()],
        is_active: true,
    }
}

impl RetryPolicyRepo {
    /// Active policy for the org, or the built-in default. Callers snapshot
    /// `max_retries` onto the attempt at scheduling time, so a later policy
    /// edit never retroactively changes in-flight attempts.
    pub async fn active_for_org(&self, org_id: i64) -> Result<RetryPolicy> {
        let row = sqlx::query(
            r#"
            SELECT org_id, name, max_retries, initial_delay_minutes, backoff_multiplier,
                   max_delay_minutes, enabled_channels, is_active
            FROM retry_policies
            WHERE org_id=$1 AND is_active
            "#,
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            let channels: serde_json::Value = row.get("enabled_channels");
            Ok(RetryPolicy {
                org_id: row.get("org_id"),
                name: row.get("name"),
                max_retries: row.get("max_retries"),
                initial_delay_minutes: row.get("initial_delay_minutes"),
                backoff_multiplier: row.get("backoff_multiplier"),
                max_delay_minutes: row.get("max_delay_minutes"),
                enabled_channels: serde_json::from_value(channels).unwrap_or_default(),
                is_active: row.get("is_active"),
            })
        } else {
            Ok(default_policy(org_id))
        }
    }

    pub async fn upsert(&self, policy: RetryPolicy) -> Result<()> {
        let channels = serde_json::to_value(&policy.enabled_channels)?;
        sqlx::query(
            r#"
            INSERT INTO retry_policies (org_id, name, max_retries, initial_delay_minutes,
                                        backoff_multiplier, max_delay_minutes, enabled_channels, is_active, updated_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,true,now())
            ON CONFLICT (org_id) WHERE is_active DO UPDATE SET
                name=EXCLUDED.name,
                max_retries=EXCLUDED.max_retries,
                initial_delay_minutes=EXCLUDED.initial_delay_minutes,
                backoff_multiplier=EXCLUDED.backoff_multiplier,
                max_delay_minutes=EXCLUDED.max_delay_minutes,
                enabled_channels=EXCLUDED.enabled_channels,
                updated_at=now()
            "#,
        )
        .bind(policy.org_id)
        .bind(policy.name)
        .bind(policy.max_retries)
        .bind(policy.initial_delay_minutes)
        .bind(policy.backoff_multiplier)
        .bind(policy.max_delay_minutes)
        .bind(channels)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
