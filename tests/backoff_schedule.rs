use chrono::{Duration, TimeZone, Utc};
use revenue_recovery::repo::retry_policy_repo::{default_policy, RetryPolicy};
use revenue_recovery::retry::backoff::next_retry_at;

fn policy(max_retries: i32, initial: i32, multiplier: f64, cap: i32) -> RetryPolicy {
    RetryPolicy {
        org_id: 1,
        name: "test".to_string(),
        max_retries,
        initial_delay_minutes: initial,
        backoff_multiplier: multiplier,
        max_delay_minutes: cap,
        enabled_channels: vec!["email".to_string()],
        is_active: true,
    }
}

#[test]
fn delay_doubles_with_each_consumed_slot() {
    let p = policy(5, 10, 2.0, 1440);
    let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();

    assert_eq!(next_retry_at(&p, now, 0), Some(now + Duration::minutes(10)));
    assert_eq!(next_retry_at(&p, now, 1), Some(now + Duration::minutes(20)));
    assert_eq!(next_retry_at(&p, now, 2), Some(now + Duration::minutes(40)));
    assert_eq!(next_retry_at(&p, now, 3), Some(now + Duration::minutes(80)));
}

#[test]
fn delay_saturates_at_the_cap() {
    let p = policy(10, 10, 2.0, 25);
    let now = Utc::now();

    assert_eq!(next_retry_at(&p, now, 0), Some(now + Duration::minutes(10)));
    assert_eq!(next_retry_at(&p, now, 1), Some(now + Duration::minutes(20)));
    // 40 minutes uncapped, held to 25
    assert_eq!(next_retry_at(&p, now, 2), Some(now + Duration::minutes(25)));
    assert_eq!(next_retry_at(&p, now, 7), Some(now + Duration::minutes(25)));
}

#[test]
fn exhausted_budget_yields_no_next_retry() {
    let p = policy(3, 10, 2.0, 1440);
    let now = Utc::now();

    assert!(next_retry_at(&p, now, 2).is_some());
    assert_eq!(next_retry_at(&p, now, 3), None);
    assert_eq!(next_retry_at(&p, now, 4), None);
}

#[test]
fn zero_budget_policy_never_schedules() {
    let p = policy(0, 10, 2.0, 1440);
    assert_eq!(next_retry_at(&p, Utc::now(), 0), None);
}

#[test]
fn fractional_multiplier_rounds_down_to_whole_seconds() {
    let p = policy(5, 7, 1.5, 1440);
    let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();

    // 7 * 1.5 = 10.5 minutes = 630 seconds
    assert_eq!(next_retry_at(&p, now, 1), Some(now + Duration::seconds(630)));
}

#[test]
fn default_policy_matches_documented_constants() {
    let p = default_policy(42);
    assert_eq!(p.org_id, 42);
    assert_eq!(p.max_retries, 3);
    assert_eq!(p.initial_delay_minutes, 60);
    assert_eq!(p.backoff_multiplier, 2.0);
    assert_eq!(p.max_delay_minutes, 1440);
    assert_eq!(p.enabled_channels, vec!["email".to_string()]);
    assert!(p.is_active);

    let now = Utc::now();
    assert_eq!(next_retry_at(&p, now, 0), Some(now + Duration::minutes(60)));
    assert_eq!(next_retry_at(&p, now, 1), Some(now + Duration::minutes(120)));
    assert_eq!(next_retry_at(&p, now, 2), Some(now + Duration::minutes(240)));
    assert_eq!(next_retry_at(&p, now, 3), None);
}
