use anyhow::{anyhow, Result};

use crate::psp::{ExternalPaymentStatus, PaymentHandle, PspClient};

pub struct StripePsp {
    pub base_url: String,
    pub secret_key: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

#[async_trait::async_trait]
impl PspClient for StripePsp {
    fn provider(&self) -> &'static str {
        "stripe"
    }

    fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }

    async fn create_payment_handle(
        &self,
        amount_minor: i64,
        currency: &str,
        reference: &str,
    ) -> Result<PaymentHandle> {
        let url = format!("{}/v1/checkout/sessions", self.base_url);
        let params = [
            ("mode", "payment".to_string()),
            ("client_reference_id", reference.to_string()),
            ("line_items[0][price_data][currency]", currency.to_lowercase()),
            (
                "line_items[0][price_data][unit_amount]",
                amount_minor.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                format!("Payment Recovery - {reference}"),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[transaction_ref]", reference.to_string()),
        ];

        let resp = self
            .client
            .post(url)
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(&params)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body: String = resp.text().await.unwrap_or_default().chars().take(200).collect();
            return Err(anyhow!("checkout session create failed: HTTP {status}: {body}"));
        }

        let v: serde_json::Value = resp.json().await?;
        let handle_id = v
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| anyhow!("checkout session response missing id"))?
            .to_string();
        let url = v.get("url").and_then(|u| u.as_str()).map(str::to_string);
        Ok(PaymentHandle { handle_id, url })
    }

    async fn fetch_status(&self, handle_id: &str) -> Result<ExternalPaymentStatus> {
        let url = format!("{}/v1/checkout/sessions/{}", self.base_url, handle_id);
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Ok(ExternalPaymentStatus::Unknown);
        }

        let v: serde_json::Value = resp.json().await?;
        let status = match v.get("payment_status").and_then(|s| s.as_str()) {
            Some("paid") => ExternalPaymentStatus::Paid,
            Some("unpaid") | Some("no_payment_required") => ExternalPaymentStatus::Open,
            _ => ExternalPaymentStatus::Unknown,
        };
        Ok(status)
    }
}
