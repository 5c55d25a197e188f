use anyhow::Result;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub mod mock;
pub mod stripe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalPaymentStatus {
    Paid,
    Open,
    Unknown,
}

impl ExternalPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalPaymentStatus::Paid => "paid",
            ExternalPaymentStatus::Open => "open",
            ExternalPaymentStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentHandle {
    pub handle_id: String,
    pub url: Option<String>,
}

/// Seam to the payment service provider. Implementations own their request
/// timeouts; the engine never cancels a call mid-flight.
#[async_trait::async_trait]
pub trait PspClient: Send + Sync {
    fn provider(&self) -> &'static str;

    fn is_configured(&self) -> bool;

    /// Idempotent on the provider side via the merchant reference: calling
    /// twice for the same reference must not create a second handle.
    async fn create_payment_handle(
        &self,
        amount_minor: i64,
        currency: &str,
        reference: &str,
    ) -> Result<PaymentHandle>;

    async fn fetch_status(&self, handle_id: &str) -> Result<ExternalPaymentStatus>;
}

/// Verifies the provider's HMAC-SHA256 hex signature over the raw body.
/// Must run before any state change.
pub fn verify_signature(raw_payload: &[u8], signature_header: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(expected) = hex::decode(signature_header.trim()) else {
        return false;
    };
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(raw_payload);
    mac.verify_slice(&expected).is_ok()
}

/// Normalized view of a processor callback event, extracted from the
/// `{id, type, data: {object: {...}}}` envelope.
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    pub event_id: String,
    pub event_type: String,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub merchant_ref: Option<String>,
    pub payload: serde_json::Value,
}

impl ParsedEvent {
    /// Event types that mean the customer paid.
    pub fn is_success(&self) -> bool {
        matches!(
            self.event_type.as_str(),
            "checkout.session.completed"
                | "payment_intent.succeeded"
                | "payment.captured"
                | "order.paid"
        )
    }

    /// Deterministic identity for the idempotency ledger: the processor's own
    /// event id, falling back to the payment/order id when absent.
    pub fn external_id(&self) -> Option<&str> {
        if !self.event_id.is_empty() {
            return Some(&self.event_id);
        }
        self.payment_id.as_deref().or(self.order_id.as_deref())
    }
}

/// Accepts both envelope shapes: stripe `{id, type, data: {object}}` and
/// razorpay `{event, payload: {payment|order: {entity}}}`. Razorpay carries
/// no top-level event id; identity falls back to the payment/order id.
pub fn parse_event(raw_payload: &[u8]) -> Result<ParsedEvent> {
    let value: serde_json::Value = serde_json::from_slice(raw_payload)?;
    let object = value
        .pointer("/data/object")
        .or_else(|| value.pointer("/payload/payment/entity"))
        .or_else(|| value.pointer("/payload/order/entity"))
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    let str_at = |v: &serde_json::Value, key: &str| {
        v.get(key).and_then(|x| x.as_str()).map(str::to_string)
    };

    let event_type = value
        .get("type")
        .or_else(|| value.get("event"))
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .to_string();

    let order_id = str_at(&object, "order_id")
        .or_else(|| {
            // checkout sessions and order entities carry their own id as the
            // order-level handle
            if event_type == "checkout.session.completed" || event_type.starts_with("order") {
                str_at(&object, "id")
            } else {
                None
            }
        });
    let payment_id = str_at(&object, "payment_intent").or_else(|| {
        if event_type.starts_with("payment") {
            str_at(&object, "id")
        } else {
            None
        }
    });
    let merchant_ref = object
        .pointer("/metadata/transaction_ref")
        .or_else(|| object.pointer("/notes/transaction_ref"))
        .and_then(|x| x.as_str())
        .map(str::to_string)
        .or_else(|| str_at(&object, "receipt"));

    Ok(ParsedEvent {
        event_id: value
            .get("id")
            .and_then(|x| x.as_str())
            .unwrap_or("")
            .to_string(),
        event_type,
        payment_id,
        order_id,
        merchant_ref,
        payload: value,
    })
}
