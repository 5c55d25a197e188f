use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::repo::attempts_repo::AttemptsRepo;
use crate::repo::retry_policy_repo::RetryPolicyRepo;
use crate::retry::backoff::next_retry_at;

/// Computes and stores next-retry timestamps and scans for due attempts. All
/// timing state lives in the store; a crashed worker loses nothing because
/// every pass recomputes from stored timestamps against wall-clock now.
#[derive(Clone)]
pub struct RetryScheduler {
    pub attempts_repo: AttemptsRepo,
    pub retry_policy_repo: RetryPolicyRepo,
}

impl RetryScheduler {
    /// Arms (or re-arms) the retry schedule for one attempt. Delays come from
    /// the org's current policy; the retry budget comes from the attempt's
    /// `max_retries` snapshot, so a policy edit never extends an in-flight
    /// attempt. On an exhausted budget the attempt is cancelled rather than
    /// silently left pending.
    pub async fn schedule_next(
        &self,
        attempt_id: i64,
        org_id: Option<i64>,
    ) -> Result<Option<DateTime<Utc>>, EngineError> {
        let Some(attempt) = self.attempts_repo.find_by_id(attempt_id).await? else {
            tracing::warn!(attempt_id, "schedule skipped: attempt not found");
            return Ok(None);
        };
        if attempt.status.is_terminal() {
            return Ok(None);
        }

        let mut policy = self.retry_policy_repo.active_for_org(org_id.unwrap_or(0)).await?;
        policy.max_retries = attempt.max_retries;

        let now = Utc::now();
        match next_retry_at(&policy, now, attempt.retry_count) {
            Some(next) => {
                self.attempts_repo.set_next_retry_at(attempt.id, Some(next)).await?;
                tracing::info!(
                    attempt_id = attempt.id,
                    retry_count = attempt.retry_count,
                    next_retry_at = %next,
                    "retry scheduled"
                );
                Ok(Some(next))
            }
            None => {
                if self.attempts_repo.cancel(attempt.id).await?.is_some() {
                    tracing::info!(
                        attempt_id = attempt.id,
                        retry_count = attempt.retry_count,
                        "retry budget exhausted, attempt cancelled"
                    );
                }
                Ok(None)
            }
        }
    }

    /// Attempts whose next_retry_at has come due. Eligibility is re-derived
    /// from stored timestamps on every pass.
    pub async fn scan_due(
        &self,
        limit: i64,
    ) -> Result<Vec<crate::domain::attempt::AttemptRow>, EngineError> {
        Ok(self.attempts_repo.due_for_retry(Utc::now(), limit).await?)
    }

    /// Flips overdue attempts to expired. Expiry remains a derived condition
    /// checked on every token read; this sweep only settles the stored status.
    pub async fn expire_sweep(&self) -> Result<u64, EngineError> {
        let count = self.attempts_repo.expire_overdue(Utc::now()).await?;
        if count > 0 {
            tracing::info!(expired = count, "expiry sweep completed");
        }
        Ok(count)
    }
}
