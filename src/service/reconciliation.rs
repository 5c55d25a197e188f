use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::transaction::{ReconLogInput, ReconSummary};
use crate::error::EngineError;
use crate::psp::{ExternalPaymentStatus, PspClient};
use crate::repo::failure_events_repo::FailureEventsRepo;
use crate::repo::recon_log_repo::ReconLogRepo;
use crate::repo::transactions_repo::TransactionsRepo;

/// Read-only drift audit: compares believed payment state against the
/// processor's authoritative state over a bounded lookback window. Appends to
/// recon_log only; never mutates transactions or attempts. A mismatch is a
/// finding for an operator, not an error.
#[derive(Clone)]
pub struct Reconciliation {
    pub transactions_repo: TransactionsRepo,
    pub failure_events_repo: FailureEventsRepo,
    pub recon_log_repo: ReconLogRepo,
    pub psp: Arc<dyn PspClient>,
}

impl Reconciliation {
    pub async fn run(&self, lookback_days: i64) -> Result<ReconSummary, EngineError> {
        if !self.psp.is_configured() {
            return Err(EngineError::Configuration(format!(
                "{} credentials missing",
                self.psp.provider()
            )));
        }

        let window_start = Utc::now() - Duration::days(lookback_days);
        let txns = self.transactions_repo.list_reconcilable_since(window_start).await?;

        let mut summary = ReconSummary::default();
        for txn in txns {
            summary.checked += 1;

            // Internal status is inferred from the event log: a
            // payment_succeeded reason row means "paid". Heuristic inherited
            // from the event-log design; see DESIGN.md.
            let internal_paid = self.failure_events_repo.has_success_event(txn.id).await?;
            let internal_status = if internal_paid { "paid" } else { "unpaid" };

            let external = match &txn.psp_order_id {
                Some(handle) => self
                    .psp
                    .fetch_status(handle)
                    .await
                    .unwrap_or(ExternalPaymentStatus::Unknown),
                None => ExternalPaymentStatus::Unknown,
            };

            let is_ok = matches!(
                (internal_paid, external),
                (true, ExternalPaymentStatus::Paid)
                    | (false, ExternalPaymentStatus::Open)
                    | (false, ExternalPaymentStatus::Unknown)
            );
            if is_ok {
                summary.ok += 1;
            } else {
                summary.mismatches += 1;
                tracing::warn!(
                    transaction_ref = %txn.transaction_ref,
                    internal_status,
                    external_status = external.as_str(),
                    "reconciliation mismatch"
                );
            }

            self.recon_log_repo
                .insert(&ReconLogInput {
                    transaction_id: txn.id,
                    psp_order_id: txn.psp_order_id.clone(),
                    psp_payment_id: txn.psp_payment_id.clone(),
                    internal_status: internal_status.to_string(),
                    external_status: external.as_str().to_string(),
                    result: if is_ok { "ok" } else { "mismatch" }.to_string(),
                    details: Some(serde_json::json!({ "transaction_ref": txn.transaction_ref })),
                })
                .await?;
        }

        tracing::info!(
            checked = summary.checked,
            ok = summary.ok,
            mismatches = summary.mismatches,
            "reconciliation run finished"
        );
        Ok(summary)
    }
}
