use chrono::{DateTime, Utc};

use crate::classifier::classify;
use crate::domain::transaction::{FailureEventIn, FailureEventRow};
use crate::error::EngineError;
use crate::repo::failure_events_repo::FailureEventsRepo;
use crate::repo::transactions_repo::{TransactionsRepo, UpsertTransactionInput};

/// Ingests a merchant-reported payment failure: upserts the transaction by
/// reference, classifies the failure, and appends the audit event.
#[derive(Clone)]
pub struct FailureIntake {
    pub transactions_repo: TransactionsRepo,
    pub failure_events_repo: FailureEventsRepo,
}

impl FailureIntake {
    pub async fn ingest(&self, payload: FailureEventIn) -> Result<FailureEventRow, EngineError> {
        let occurred_at = payload
            .occurred_at
            .as_deref()
            .map(parse_occurred_at)
            .transpose()?;

        let txn = self
            .transactions_repo
            .upsert_by_ref(UpsertTransactionInput {
                transaction_ref: &payload.transaction_ref,
                org_id: None,
                amount_minor: payload.amount,
                currency: payload.currency.as_deref(),
                customer_email: payload.customer_email.as_deref(),
                customer_phone: payload.customer_phone.as_deref(),
            })
            .await?;

        let classification = classify(
            payload.failure_code.as_deref(),
            Some(payload.failure_reason.as_str()),
        );
        let mut meta = serde_json::Map::new();
        meta.insert(
            "classification".to_string(),
            serde_json::to_value(&classification).map_err(anyhow::Error::from)?,
        );
        if let Some(extra) = payload.metadata {
            meta.insert("metadata".to_string(), extra);
        }

        let event = self
            .failure_events_repo
            .insert(
                txn.id,
                payload.gateway.as_deref(),
                payload.failure_code.as_deref(),
                &payload.failure_reason,
                Some(serde_json::Value::Object(meta)),
                occurred_at,
            )
            .await?;

        tracing::info!(
            transaction_ref = %payload.transaction_ref,
            reason = %payload.failure_reason,
            category = ?classification.category,
            "failure event recorded"
        );
        Ok(event)
    }

    pub async fn list_by_ref(
        &self,
        transaction_ref: &str,
    ) -> Result<Vec<FailureEventRow>, EngineError> {
        let Some(txn) = self.transactions_repo.find_by_ref(transaction_ref).await? else {
            return Ok(Vec::new());
        };
        Ok(self.failure_events_repo.list_for_transaction(txn.id).await?)
    }
}

fn parse_occurred_at(raw: &str) -> Result<DateTime<Utc>, EngineError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            EngineError::Validation(
                "invalid occurred_at, use ISO-8601 (e.g. 2025-10-07T14:25:00Z)".to_string(),
            )
        })
}
