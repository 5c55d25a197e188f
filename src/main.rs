use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use revenue_recovery::config::AppConfig;
use revenue_recovery::notify::email::EmailTransport;
use revenue_recovery::notify::sms::SmsTransport;
use revenue_recovery::psp::stripe::StripePsp;
use revenue_recovery::repo::attempts_repo::AttemptsRepo;
use revenue_recovery::repo::failure_events_repo::FailureEventsRepo;
use revenue_recovery::repo::notification_log_repo::NotificationLogRepo;
use revenue_recovery::repo::psp_events_repo::PspEventsRepo;
use revenue_recovery::repo::recon_log_repo::ReconLogRepo;
use revenue_recovery::repo::retry_policy_repo::RetryPolicyRepo;
use revenue_recovery::repo::transactions_repo::TransactionsRepo;
use revenue_recovery::retry::scheduler::RetryScheduler;
use revenue_recovery::service::dispatcher::NotificationDispatcher;
use revenue_recovery::service::failure_intake::FailureIntake;
use revenue_recovery::service::ingestor::PspEventIngestor;
use revenue_recovery::service::reconciliation::Reconciliation;
use revenue_recovery::service::recovery::RecoveryService;
use revenue_recovery::AppState;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let transactions_repo = TransactionsRepo { pool: pool.clone() };
    let failure_events_repo = FailureEventsRepo { pool: pool.clone() };
    let attempts_repo = AttemptsRepo { pool: pool.clone() };
    let retry_policy_repo = RetryPolicyRepo { pool: pool.clone() };
    let notification_log_repo = NotificationLogRepo { pool: pool.clone() };
    let psp_events_repo = PspEventsRepo { pool: pool.clone() };
    let recon_log_repo = ReconLogRepo { pool: pool.clone() };

    let scheduler = RetryScheduler {
        attempts_repo: attempts_repo.clone(),
        retry_policy_repo: retry_policy_repo.clone(),
    };

    let psp = Arc::new(StripePsp {
        base_url: cfg.psp_base_url.clone(),
        secret_key: cfg.psp_key_secret.clone(),
        timeout_ms: 5000,
        client: reqwest::Client::new(),
    });

    let dispatcher = NotificationDispatcher {
        transactions_repo: transactions_repo.clone(),
        attempts_repo: attempts_repo.clone(),
        notification_log_repo,
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

    let state = AppState {
        recovery_service: RecoveryService {
            transactions_repo: transactions_repo.clone(),
            attempts_repo: attempts_repo.clone(),
            retry_policy_repo: retry_policy_repo.clone(),
            scheduler: scheduler.clone(),
            psp: psp.clone(),
            public_base_url: cfg.public_base_url.clone(),
        },
        failure_intake: FailureIntake {
            transactions_repo: transactions_repo.clone(),
            failure_events_repo: failure_events_repo.clone(),
        },
        ingestor: PspEventIngestor {
            transactions_repo: transactions_repo.clone(),
            attempts_repo: attempts_repo.clone(),
            psp_events_repo,
            provider: "stripe".to_string(),
            webhook_secret: cfg.psp_webhook_secret.clone(),
        },
        reconciliation: Reconciliation {
            transactions_repo,
            failure_events_repo,
            recon_log_repo,
            psp,
        },
        scheduler,
        dispatcher,
        retry_policy_repo,
        fallback_retry_runner: cfg.fallback_retry_runner,
    };

    let admin_routes = Router::new()
        .route(
            "/v1/retry-policies/:org_id",
            put(revenue_recovery::http::handlers::retry_policy::upsert_retry_policy),
        )
        .route(
            "/v1/recon/run",
            post(revenue_recovery::http::handlers::recon::run),
        )
        .route(
            "/v1/retry/trigger-due",
            post(revenue_recovery::http::handlers::retry_trigger::trigger_due),
        )
        .layer(from_fn_with_state(
            cfg.internal_api_key.clone(),
            revenue_recovery::http::middleware::admin_auth::require_internal_api_key,
        ));

    let public_token_routes = Router::new()
        .route(
            "/v1/pay/:token",
            get(revenue_recovery::http::handlers::recoveries::fetch_by_token),
        )
        .route(
            "/v1/pay/:token/open",
            post(revenue_recovery::http::handlers::recoveries::open_by_token),
        )
        .route(
            "/v1/pay/:token/complete",
            post(revenue_recovery::http::handlers::recoveries::complete_by_token),
        )
        .layer(from_fn_with_state(
            revenue_recovery::http::middleware::rate_limit::RateLimitState {
                redis_client: redis::Client::open(cfg.redis_url.clone())?,
                max_per_minute: 120,
            },
            revenue_recovery::http::middleware::rate_limit::enforce,
        ));

    let app = Router::new()
        .route(
            "/v1/events/payment_failed",
            post(revenue_recovery::http::handlers::events::payment_failed),
        )
        .route(
            "/v1/events/by_ref/:transaction_ref",
            get(revenue_recovery::http::handlers::events::list_by_ref),
        )
        .route(
            "/v1/recoveries/by_ref/:transaction_ref/link",
            post(revenue_recovery::http::handlers::recoveries::create_link),
        )
        .route(
            "/v1/recoveries/by_ref/:transaction_ref",
            get(revenue_recovery::http::handlers::recoveries::list_by_ref),
        )
        .route(
            "/v1/recoveries/by_ref/:transaction_ref/payment-handle",
            post(revenue_recovery::http::handlers::recoveries::create_payment_handle),
        )
        .route(
            "/v1/classify",
            post(revenue_recovery::http::handlers::classify::classify_failure),
        )
        .route(
            "/v1/retry-policies/:org_id",
            get(revenue_recovery::http::handlers::retry_policy::get_retry_policy),
        )
        .route(
            "/v1/webhooks/psp",
            post(revenue_recovery::http::handlers::webhooks::receive),
        )
        .route("/ops/readiness", get(revenue_recovery::http::handlers::ops::readiness))
        .route("/ops/liveness", get(revenue_recovery::http::handlers::ops::liveness))
        .merge(admin_routes)
        .merge(public_token_routes)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
