use anyhow::Result;

use crate::psp::{ExternalPaymentStatus, PaymentHandle, PspClient};

pub struct MockPsp {
    pub behavior: String,
}

#[async_trait::async_trait]
impl PspClient for MockPsp {
    fn provider(&self) -> &'static str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn create_payment_handle(
        &self,
        _amount_minor: i64,
        _currency: &str,
        reference: &str,
    ) -> Result<PaymentHandle> {
        Ok(PaymentHandle {
            handle_id: format!("cs_mock_{reference}"),
            url: Some(format!("https://pay.mock.dev/{reference}")),
        })
    }

    async fn fetch_status(&self, _handle_id: &str) -> Result<ExternalPaymentStatus> {
        let status = match self.behavior.as_str() {
            "ALWAYS_PAID" => ExternalPaymentStatus::Paid,
            "ALWAYS_UNKNOWN" => ExternalPaymentStatus::Unknown,
            _ => ExternalPaymentStatus::Open,
        };
        Ok(status)
    }
}
