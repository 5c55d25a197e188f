pub mod classifier;
pub mod config;
pub mod error;
pub mod domain {
    pub mod attempt;
    pub mod transaction;
}
pub mod http {
    pub mod handlers {
        pub mod classify;
        pub mod events;
        pub mod ops;
        pub mod recon;
        pub mod recoveries;
        pub mod retry_policy;
        pub mod retry_trigger;
        pub mod webhooks;
    }
    pub mod middleware {
        pub mod admin_auth;
        pub mod rate_limit;
    }
}
pub mod notify;
pub mod psp;
pub mod repo {
    pub mod attempts_repo;
    pub mod failure_events_repo;
    pub mod notification_log_repo;
    pub mod psp_events_repo;
    pub mod recon_log_repo;
    pub mod retry_policy_repo;
    pub mod transactions_repo;
}
pub mod retry {
    pub mod backoff;
    pub mod scheduler;
}
pub mod service {
    pub mod dispatcher;
    pub mod failure_intake;
    pub mod ingestor;
    pub mod reconciliation;
    pub mod recovery;
}

#[derive(Clone)]
pub struct AppState {
    pub recovery_service: service::recovery::RecoveryService,
    pub failure_intake: service::failure_intake::FailureIntake,
    pub ingestor: service::ingestor::PspEventIngestor,
    pub reconciliation: service::reconciliation::Reconciliation,
    pub scheduler: retry::scheduler::RetryScheduler,
    pub dispatcher: service::dispatcher::NotificationDispatcher,
    pub retry_policy_repo: repo::retry_policy_repo::RetryPolicyRepo,
    pub fallback_retry_runner: bool,
}
