use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::attempt::{generate_token, AttemptRow, AttemptStatus, Channel};
use crate::error::EngineError;
use crate::notify::build_recovery_url;
use crate::psp::PspClient;
use crate::repo::attempts_repo::AttemptsRepo;
use crate::repo::retry_policy_repo::RetryPolicyRepo;
use crate::repo::transactions_repo::TransactionsRepo;
use crate::retry::scheduler::RetryScheduler;

#[derive(Clone)]
pub struct RecoveryService {
    pub transactions_repo: TransactionsRepo,
    pub attempts_repo: AttemptsRepo,
    pub retry_policy_repo: RetryPolicyRepo,
    pub scheduler: RetryScheduler,
    pub psp: Arc<dyn PspClient>,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoveryLinkOut {
    pub attempt_id: i64,
    pub transaction_id: i64,
    pub token: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl RecoveryService {
    /// Issues a recovery attempt for a known transaction. The policy's
    /// max_retries is snapshotted onto the attempt here; a negative TTL is
    /// permitted and yields an attempt that is already expired on fetch.
    pub async fn create_link(
        &self,
        transaction_ref: &str,
        channel: Option<Channel>,
        ttl_hours: i64,
    ) -> Result<RecoveryLinkOut, EngineError> {
        let txn = self
            .transactions_repo
            .find_by_ref(transaction_ref)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("transaction_ref {transaction_ref}")))?;

        let policy = self
            .retry_policy_repo
            .active_for_org(txn.org_id.unwrap_or(0))
            .await?;

        let token = generate_token();
        let expires_at = link_expiry(Utc::now(), ttl_hours)?;
        let attempt = self
            .attempts_repo
            .insert(
                txn.id,
                &txn.transaction_ref,
                channel.unwrap_or(Channel::Email),
                &token,
                expires_at,
                policy.max_retries,
            )
            .await?;

        // Arm the first notification pass. Non-fatal: link creation succeeds
        // even when scheduling hits a transient store error.
        if let Err(e) = self.scheduler.schedule_next(attempt.id, txn.org_id).await {
            tracing::warn!(attempt_id = attempt.id, error = %e, "initial retry scheduling failed");
        }

        tracing::info!(
            attempt_id = attempt.id,
            transaction_ref = %txn.transaction_ref,
            channel = attempt.channel.as_str(),
            "recovery link created"
        );

        Ok(RecoveryLinkOut {
            attempt_id: attempt.id,
            transaction_id: txn.id,
            url: build_recovery_url(&self.public_base_url, &token),
            token,
            expires_at,
        })
    }

    pub async fn list_by_ref(&self, transaction_ref: &str) -> Result<Vec<AttemptRow>, EngineError> {
        let Some(txn) = self.transactions_repo.find_by_ref(transaction_ref).await? else {
            return Ok(Vec::new());
        };
        Ok(self.attempts_repo.list_for_transaction(txn.id).await?)
    }

    /// Token read with derived-expiry and used checks. EXPIRED and USED are
    /// distinct outcomes and must never collapse into a generic error.
    pub async fn fetch_by_token(&self, token: &str) -> Result<AttemptRow, EngineError> {
        let attempt = self
            .attempts_repo
            .find_by_token(token)
            .await?
            .ok_or_else(|| EngineError::NotFound("token".to_string()))?;
        guard_live(&attempt)?;
        Ok(attempt)
    }

    /// Idempotent open: a second open returns the state the first one
    /// produced; opening an expired or used token is the distinguishable
    /// terminal error.
    pub async fn open_by_token(&self, token: &str) -> Result<AttemptRow, EngineError> {
        let attempt = self.fetch_by_token(token).await?;
        if attempt.status == AttemptStatus::Opened {
            return Ok(attempt);
        }
        match self.attempts_repo.mark_opened(attempt.id).await? {
            Some(updated) => Ok(updated),
            // lost a race with another worker; re-read and re-apply the guards
            None => self.fetch_by_token(token).await,
        }
    }

    /// Idempotent complete: repeating it on a completed attempt returns the
    /// same terminal row.
    pub async fn complete_by_token(&self, token: &str) -> Result<AttemptRow, EngineError> {
        let attempt = self
            .attempts_repo
            .find_by_token(token)
            .await?
            .ok_or_else(|| EngineError::NotFound("token".to_string()))?;

        if attempt.status == AttemptStatus::Completed {
            return Ok(attempt);
        }
        guard_live(&attempt)?;

        match self.attempts_repo.complete(attempt.id).await? {
            Some(updated) => {
                tracing::info!(attempt_id = updated.id, "recovery attempt completed");
                Ok(updated)
            }
            None => {
                let current = self
                    .attempts_repo
                    .find_by_token(token)
                    .await?
                    .ok_or_else(|| EngineError::NotFound("token".to_string()))?;
                if current.status == AttemptStatus::Completed {
                    Ok(current)
                } else {
                    Err(EngineError::Conflict(format!(
                        "attempt is {}",
                        current.status.as_str()
                    )))
                }
            }
        }
    }

    /// Idempotent order/session creation against the processor: returns the
    /// stored handle when one exists, fails fast when the integration is not
    /// configured.
    pub async fn ensure_payment_handle(&self, transaction_ref: &str) -> Result<String, EngineError> {
        if !self.psp.is_configured() {
            return Err(EngineError::Configuration(format!(
                "{} credentials missing",
                self.psp.provider()
            )));
        }
        let txn = self
            .transactions_repo
            .find_by_ref(transaction_ref)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("transaction_ref {transaction_ref}")))?;

        if let Some(existing) = txn.psp_order_id {
            return Ok(existing);
        }
        let (Some(amount), Some(currency)) = (txn.amount_minor, txn.currency.as_deref()) else {
            return Err(EngineError::Validation(
                "transaction has no amount/currency".to_string(),
            ));
        };

        let handle = self
            .psp
            .create_payment_handle(amount, currency, &txn.transaction_ref)
            .await
            .map_err(EngineError::Internal)?;

        self.transactions_repo.set_psp_order_id(txn.id, &handle.handle_id).await?;
        if let Some(url) = &handle.url {
            self.transactions_repo.set_payment_link_url(txn.id, url).await?;
        }
        tracing::info!(
            transaction_ref = %txn.transaction_ref,
            handle_id = %handle.handle_id,
            "payment handle created"
        );
        Ok(handle.handle_id)
    }
}

/// Expiry timestamp for a new link. The TTL comes straight from the request
/// body, so an out-of-range value is a validation error, never an arithmetic
/// panic. Negative TTLs stay legal and yield an already-expired attempt.
fn link_expiry(
    now: DateTime<Utc>,
    ttl_hours: i64,
) -> Result<DateTime<Utc>, EngineError> {
    Duration::try_hours(ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| EngineError::Validation("ttl_hours out of range".to_string()))
}

/// Shared token guards, in precedence order: a used token reports USED even
/// when it is also past expiry.
fn guard_live(attempt: &AttemptRow) -> Result<(), EngineError> {
    if attempt.used_at.is_some() || attempt.status == AttemptStatus::Completed {
        return Err(EngineError::TokenUsed);
    }
    if attempt.status == AttemptStatus::Expired || attempt.is_expired(Utc::now()) {
        return Err(EngineError::TokenExpired);
    }
    if attempt.status == AttemptStatus::Cancelled {
        return Err(EngineError::Conflict("attempt is cancelled".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn attempt(status: AttemptStatus, expires_in_hours: i64, used: bool) -> AttemptRow {
        let now = Utc::now();
        AttemptRow {
            id: 1,
            transaction_id: 1,
            transaction_ref: "TXN-1".to_string(),
            channel: Channel::Email,
            token: "tok".to_string(),
            status,
            expires_at: now + Duration::hours(expires_in_hours),
            retry_count: 0,
            max_retries: 3,
            last_retry_at: None,
            next_retry_at: None,
            opened_at: None,
            used_at: used.then_some(now),
            created_at: now,
        }
    }

    #[test]
    fn link_expiry_rejects_overflowing_ttl() {
        let now = Utc::now();
        assert!(matches!(
            link_expiry(now, 10_000_000_000_000),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            link_expiry(now, i64::MIN),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn link_expiry_allows_negative_ttl() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(link_expiry(now, 168).unwrap(), now + Duration::hours(168));
        // already expired on issue, by design
        assert_eq!(link_expiry(now, -1).unwrap(), now - Duration::hours(1));
    }

    #[test]
    fn used_takes_precedence_over_expired() {
        let a = attempt(AttemptStatus::Completed, -2, true);
        assert!(matches!(guard_live(&a), Err(EngineError::TokenUsed)));
    }

    #[test]
    fn overdue_attempt_reports_expired() {
        let a = attempt(AttemptStatus::Sent, -2, false);
        assert!(matches!(guard_live(&a), Err(EngineError::TokenExpired)));

        let a = attempt(AttemptStatus::Expired, 24, false);
        assert!(matches!(guard_live(&a), Err(EngineError::TokenExpired)));
    }

    #[test]
    fn cancelled_attempt_is_a_conflict() {
        let a = attempt(AttemptStatus::Cancelled, 24, false);
        assert!(matches!(guard_live(&a), Err(EngineError::Conflict(_))));
    }

    #[test]
    fn live_attempt_passes_the_guards() {
        for status in [AttemptStatus::Created, AttemptStatus::Sent, AttemptStatus::Opened] {
            assert!(guard_live(&attempt(status, 24, false)).is_ok());
        }
    }
}
