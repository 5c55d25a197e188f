use anyhow::{anyhow, Result};
use serde_json::json;

use crate::domain::attempt::Channel;
use crate::notify::{DeliveryReceipt, NotificationTransport, RenderedMessage};

/// Email delivery through an HTTP mail provider API.
pub struct EmailTransport {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

#[async_trait::async_trait]
impl NotificationTransport for EmailTransport {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn provider(&self) -> &'static str {
        "email-api"
    }

    async fn send(&self, recipient: &str, message: &RenderedMessage) -> Result<DeliveryReceipt> {
        let body = json!({
            "from": { "email": self.from_address },
            "personalizations": [{ "to": [{ "email": recipient }] }],
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.body }],
        });

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text: String = resp.text().await.unwrap_or_default().chars().take(200).collect();
            return Err(anyhow!("email send failed: HTTP {status}: {text}"));
        }

        let message_id = resp
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(DeliveryReceipt {
            provider: self.provider(),
            provider_message_id: message_id,
        })
    }
}
