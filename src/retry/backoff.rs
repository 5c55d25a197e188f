use chrono::{DateTime, Duration, Utc};

use crate::repo::retry_policy_repo::RetryPolicy;

/// Exponential backoff with a cap: `initial * multiplier^retry_count`,
/// saturating at `max_delay_minutes`. Returns `None` once the retry budget is
/// spent; the caller is responsible for cancelling the attempt so it drops
/// out of future scheduler passes.
pub fn next_retry_at(
    policy: &RetryPolicy,
    now: DateTime<Utc>,
    retry_count: i32,
) -> Option<DateTime<Utc>> {
    if retry_count >= policy.max_retries {
        return None;
    }
    let raw = policy.initial_delay_minutes as f64
        * policy.backoff_multiplier.powi(retry_count.max(0));
    let delay_minutes = raw.min(policy.max_delay_minutes as f64);
    Some(now + Duration::seconds((delay_minutes * 60.0) as i64))
}
