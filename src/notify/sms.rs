use anyhow::{anyhow, Result};

use crate::domain::attempt::Channel;
use crate::notify::{DeliveryReceipt, NotificationTransport, RenderedMessage};

/// SMS delivery through a Twilio-style messages API.
pub struct SmsTransport {
    pub api_url: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

#[async_trait::async_trait]
impl NotificationTransport for SmsTransport {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    fn provider(&self) -> &'static str {
        "twilio"
    }

    async fn send(&self, recipient: &str, message: &RenderedMessage) -> Result<DeliveryReceipt> {
        if self.account_sid.is_empty() || self.auth_token.is_empty() {
            return Err(anyhow!("sms credentials not configured"));
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_url, self.account_sid
        );
        let params = [
            ("To", recipient.to_string()),
            ("From", self.from_number.clone()),
            ("Body", message.body.clone()),
        ];

        let resp = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text: String = resp.text().await.unwrap_or_default().chars().take(200).collect();
            return Err(anyhow!("sms send failed: HTTP {status}: {text}"));
        }

        let v: serde_json::Value = resp.json().await.unwrap_or_default();
        let sid = v.get("sid").and_then(|s| s.as_str()).map(str::to_string);

        Ok(DeliveryReceipt {
            provider: self.provider(),
            provider_message_id: sid,
        })
    }
}
