use anyhow::{anyhow, Result};

use crate::domain::attempt::Channel;
use crate::notify::{DeliveryReceipt, NotificationTransport, RenderedMessage};

pub struct MockTransport {
    pub channel: Channel,
    pub behavior: String,
}

#[async_trait::async_trait]
impl NotificationTransport for MockTransport {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn provider(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, _recipient: &str, _message: &RenderedMessage) -> Result<DeliveryReceipt> {
        match self.behavior.as_str() {
            "ALWAYS_FAILURE" => Err(anyhow!("mock transport failure")),
            _ => Ok(DeliveryReceipt {
                provider: "mock",
                provider_message_id: Some(format!("mock_{}", uuid::Uuid::new_v4())),
            }),
        }
    }
}
