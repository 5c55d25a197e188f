use std::sync::Arc;

use crate::domain::attempt::{AttemptRow, Channel};
use crate::error::EngineError;
use crate::notify::{build_recovery_url, render, NotificationTransport};
use crate::repo::attempts_repo::AttemptsRepo;
use crate::repo::notification_log_repo::{NotificationLogInput, NotificationLogRepo};
use crate::repo::transactions_repo::TransactionsRepo;
use crate::retry::scheduler::RetryScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// Channel has no implemented transport; the attempt was left
    /// non-advanced rather than falsely reported as sent.
    Skipped,
}

/// Sends one outreach attempt on one channel, records the outcome, and
/// re-arms the scheduler. Holds no exclusive resource across the transport
/// call.
#[derive(Clone)]
pub struct NotificationDispatcher {
    pub transactions_repo: TransactionsRepo,
    pub attempts_repo: AttemptsRepo,
    pub notification_log_repo: NotificationLogRepo,
    pub scheduler: RetryScheduler,
    pub email: Arc<dyn NotificationTransport>,
    pub sms: Arc<dyn NotificationTransport>,
    pub public_base_url: String,
}

impl NotificationDispatcher {
    pub async fn dispatch(&self, attempt: &AttemptRow) -> Result<DispatchOutcome, EngineError> {
        let txn = self
            .transactions_repo
            .find_by_ref(&attempt.transaction_ref)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("transaction_ref {}", attempt.transaction_ref))
            })?;

        let transport: &Arc<dyn NotificationTransport> = match attempt.channel {
            Channel::Email => &self.email,
            Channel::Sms => &self.sms,
            Channel::Whatsapp => {
                tracing::warn!(
                    attempt_id = attempt.id,
                    "whatsapp transport not implemented, attempt left in place"
                );
                return Ok(DispatchOutcome::Skipped);
            }
        };

        let recipient = match attempt.channel {
            Channel::Email => txn.customer_email.clone(),
            Channel::Sms | Channel::Whatsapp => txn.customer_phone.clone(),
        };

        // The retry slot is consumed before the transport call: a failed send
        // still counts against the budget. Intentional, see DESIGN.md.
        self.attempts_repo.consume_retry_slot(attempt.id).await?;

        // Prefer the processor-hosted payment link over the generic recovery
        // page when the transaction has one.
        let recovery_url = build_recovery_url(&self.public_base_url, &attempt.token);
        let payment_link = txn.payment_link_url.as_deref().unwrap_or(&recovery_url);
        let amount = txn.amount_minor.zip(txn.currency.as_deref());
        let message = render(attempt.channel, payment_link, amount);

        let log_input = NotificationLogInput {
            recovery_attempt_id: attempt.id,
            channel: attempt.channel.as_str(),
            recipient: recipient.as_deref().unwrap_or(""),
            provider: transport.provider(),
        };

        let Some(recipient) = recipient.as_deref().filter(|r| !r.is_empty()) else {
            self.notification_log_repo
                .record_failed(log_input, "no recipient on file")
                .await?;
            return Err(EngineError::TransientDelivery(
                "no recipient on file".to_string(),
            ));
        };

        match transport.send(recipient, &message).await {
            Ok(receipt) => {
                self.notification_log_repo
                    .record_sent(log_input, receipt.provider_message_id.as_deref())
                    .await?;
                let updated = self.attempts_repo.mark_sent(attempt.id).await?;

                tracing::info!(
                    attempt_id = attempt.id,
                    channel = attempt.channel.as_str(),
                    retry_count = attempt.retry_count + 1,
                    "recovery notification sent"
                );

                // Re-arm while the attempt is live and under budget; the
                // scheduler cancels it when the budget is spent.
                let still_live = updated.map(|a| !a.status.is_terminal()).unwrap_or(false);
                if still_live {
                    self.scheduler.schedule_next(attempt.id, txn.org_id).await?;
                }
                Ok(DispatchOutcome::Sent)
            }
            Err(e) => {
                self.notification_log_repo
                    .record_failed(log_input, &e.to_string())
                    .await?;
                tracing::error!(
                    attempt_id = attempt.id,
                    channel = attempt.channel.as_str(),
                    error = %e,
                    "recovery notification failed"
                );
                // The scheduler's backoff governs the next try; never retried
                // synchronously here.
                Err(EngineError::TransientDelivery(e.to_string()))
            }
        }
    }
}
