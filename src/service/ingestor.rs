use serde::Serialize;

use crate::error::EngineError;
use crate::psp::{parse_event, verify_signature, ParsedEvent};
use crate::repo::attempts_repo::AttemptsRepo;
use crate::repo::psp_events_repo::PspEventsRepo;
use crate::repo::transactions_repo::TransactionsRepo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    Applied,
    AlreadyProcessed,
    /// Event could not be resolved to a known transaction; dropped without
    /// error so the processor does not retry forever.
    Ignored,
}

/// Idempotently applies processor callback events. The dedup decision is the
/// ledger's uniqueness constraint, never an in-process check: concurrent
/// workers receiving the same redelivery race at the store and exactly one
/// applies the effects.
#[derive(Clone)]
pub struct PspEventIngestor {
    pub transactions_repo: TransactionsRepo,
    pub attempts_repo: AttemptsRepo,
    pub psp_events_repo: PspEventsRepo,
    pub provider: String,
    pub webhook_secret: String,
}

impl PspEventIngestor {
    pub async fn ingest(
        &self,
        raw_payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<IngestOutcome, EngineError> {
        if self.webhook_secret.is_empty() {
            return Err(EngineError::Configuration(format!(
                "{} webhook secret missing",
                self.provider
            )));
        }
        let signature = signature_header
            .ok_or_else(|| EngineError::Validation("missing signature header".to_string()))?;
        if !verify_signature(raw_payload, signature, &self.webhook_secret) {
            return Err(EngineError::Validation("invalid signature".to_string()));
        }

        let event = parse_event(raw_payload)
            .map_err(|e| EngineError::Validation(format!("malformed event payload: {e}")))?;

        let Some(external_id) = event.external_id().map(str::to_string) else {
            tracing::warn!(provider = %self.provider, "event carries no usable id, dropped");
            return Ok(IngestOutcome::Ignored);
        };

        let first_seen = self
            .psp_events_repo
            .record_once(&self.provider, &event.event_type, &external_id, &event.payload)
            .await?;
        if !first_seen {
            tracing::info!(
                provider = %self.provider,
                event_type = %event.event_type,
                external_id = %external_id,
                "duplicate event delivery, already processed"
            );
            return Ok(IngestOutcome::AlreadyProcessed);
        }

        if !event.is_success() {
            tracing::info!(
                provider = %self.provider,
                event_type = %event.event_type,
                "event type recorded but not actionable"
            );
            return Ok(IngestOutcome::Ignored);
        }

        self.apply_success(&event).await
    }

    async fn apply_success(&self, event: &ParsedEvent) -> Result<IngestOutcome, EngineError> {
        // Resolve by processor-assigned order/session id, then by the
        // embedded merchant reference.
        let mut txn = None;
        if let Some(order_id) = &event.order_id {
            txn = self.transactions_repo.find_by_psp_order_id(order_id).await?;
        }
        if txn.is_none() {
            if let Some(reference) = &event.merchant_ref {
                txn = self.transactions_repo.find_by_ref(reference).await?;
            }
        }
        let Some(txn) = txn else {
            tracing::warn!(
                provider = %self.provider,
                event_type = %event.event_type,
                order_id = event.order_id.as_deref().unwrap_or(""),
                "success event does not match a known transaction, dropped"
            );
            return Ok(IngestOutcome::Ignored);
        };

        if let Some(payment_id) = &event.payment_id {
            // Guard: a transaction already completed with this exact payment
            // id is a replay that slipped past the ledger (e.g. a different
            // event type for the same payment).
            if txn.psp_payment_id.as_deref() == Some(payment_id.as_str()) {
                return Ok(IngestOutcome::AlreadyProcessed);
            }
            self.transactions_repo.set_psp_payment_id(txn.id, payment_id).await?;
        }
        if let Some(order_id) = &event.order_id {
            self.transactions_repo.set_psp_order_id(txn.id, order_id).await?;
        }

        if let Some(attempt) = self
            .attempts_repo
            .latest_active_for_transaction(txn.id, &txn.transaction_ref)
            .await?
        {
            if self.attempts_repo.complete(attempt.id).await?.is_some() {
                tracing::info!(
                    attempt_id = attempt.id,
                    transaction_ref = %txn.transaction_ref,
                    event_type = %event.event_type,
                    "recovery attempt completed via processor event"
                );
            }
        }

        Ok(IngestOutcome::Applied)
    }
}
