use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub transaction_ref: String,
    pub org_id: Option<i64>,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub psp_order_id: Option<String>,
    pub psp_payment_id: Option<String>,
    pub payment_link_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailureEventIn {
    pub transaction_ref: String,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub gateway: Option<String>,
    pub failure_code: Option<String>,
    pub failure_reason: String,
    pub occurred_at: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEventRow {
    pub id: i64,
    pub transaction_id: i64,
    pub gateway: Option<String>,
    pub code: Option<String>,
    pub reason: String,
    pub meta: Option<serde_json::Value>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconLogInput {
    pub transaction_id: i64,
    pub psp_order_id: Option<String>,
    pub psp_payment_id: Option<String>,
    pub internal_status: String,
    pub external_status: String,
    pub result: String,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReconSummary {
    pub checked: i64,
    pub ok: i64,
    pub mismatches: i64,
}
