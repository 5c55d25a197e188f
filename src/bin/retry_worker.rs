use std::sync::Arc;

use anyhow::Result;
use revenue_recovery::config::AppConfig;
use revenue_recovery::notify::email::EmailTransport;
use revenue_recovery::notify::sms::SmsTransport;
use revenue_recovery::psp::stripe::StripePsp;
use revenue_recovery::repo::attempts_repo::AttemptsRepo;
use revenue_recovery::repo::failure_events_repo::FailureEventsRepo;
use revenue_recovery::repo::notification_log_repo::NotificationLogRepo;
use revenue_recovery::repo::recon_log_repo::ReconLogRepo;
use revenue_recovery::repo::retry_policy_repo::RetryPolicyRepo;
use revenue_recovery::repo::transactions_repo::TransactionsRepo;
use revenue_recovery::retry::scheduler::RetryScheduler;
use revenue_recovery::service::dispatcher::NotificationDispatcher;
use revenue_recovery::service::reconciliation::Reconciliation;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

const TICK_SECS: u64 = 60;
const RECON_EVERY_TICKS: u64 = 60 * 24; // daily against a one-minute tick
const BATCH_SIZE: i64 = 100;

/// Background worker driving the retry scan, the expiry sweep and the
/// periodic reconciliation. Safe to run as multiple instances: every
/// correctness decision is a conditional write at the store.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&cfg.database_url)
        .await?;

    let transactions_repo = TransactionsRepo { pool: pool.clone() };
    let attempts_repo = AttemptsRepo { pool: pool.clone() };
    let retry_policy_repo = RetryPolicyRepo { pool: pool.clone() };

    let scheduler = RetryScheduler {
        attempts_repo: attempts_repo.clone(),
        retry_policy_repo,
    };

    let dispatcher = NotificationDispatcher {
        transactions_repo: transactions_repo.clone(),
        attempts_repo,
        notification_log_repo: NotificationLogRepo { pool: pool.clone() },
        scheduler: scheduler.clone(),
        email: Arc::new(EmailTransport {
            api_url: cfg.email_api_url.clone(),
            api_key: cfg.email_api_key.clone(),
            from_address: cfg.email_from.clone(),
            timeout_ms: 5000,
            client: reqwest::Client::new(),
        }),
        sms: Arc::new(SmsTransport {
            api_url: cfg.sms_api_url.clone(),
            account_sid: cfg.sms_account_sid.clone(),
            auth_token: cfg.sms_auth_token.clone(),
            from_number: cfg.sms_from_number.clone(),
            timeout_ms: 5000,
            client: reqwest::Client::new(),
        }),
        public_base_url: cfg.public_base_url.clone(),
    };

    let reconciliation = Reconciliation {
        transactions_repo,
        failure_events_repo: FailureEventsRepo { pool: pool.clone() },
        recon_log_repo: ReconLogRepo { pool },
        psp: Arc::new(StripePsp {
            base_url: cfg.psp_base_url.clone(),
            secret_key: cfg.psp_key_secret.clone(),
            timeout_ms: 5000,
            client: reqwest::Client::new(),
        }),
    };

    let mut tick: u64 = 0;
    loop {
        tick += 1;

        match scheduler.scan_due(BATCH_SIZE).await {
            Ok(due) => {
                if !due.is_empty() {
                    tracing::info!(found = due.len(), "retry scan found due attempts");
                }
                for attempt in &due {
                    if let Err(e) = dispatcher.dispatch(attempt).await {
                        tracing::warn!(attempt_id = attempt.id, error = %e, "dispatch failed");
                    }
                }
            }
            Err(e) => tracing::error!(error = %e, "retry scan failed"),
        }

        if let Err(e) = scheduler.expire_sweep().await {
            tracing::error!(error = %e, "expiry sweep failed");
        }

        if tick % RECON_EVERY_TICKS == 0 {
            match reconciliation.run(30).await {
                Ok(summary) => tracing::info!(
                    checked = summary.checked,
                    mismatches = summary.mismatches,
                    "scheduled reconciliation finished"
                ),
                Err(e) => tracing::warn!(error = %e, "scheduled reconciliation skipped"),
            }
        }

        tokio::time::sleep(std::time::Duration::from_secs(TICK_SECS)).await;
    }
}
