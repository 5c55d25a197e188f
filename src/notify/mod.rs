use anyhow::Result;

use crate::domain::attempt::Channel;

pub mod email;
pub mod mock;
pub mod sms;

#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub provider: &'static str,
    pub provider_message_id: Option<String>,
}

/// Outbound transport for one channel. Failures surface as errors; the
/// scheduler's backoff cadence, not the transport, governs retries.
#[async_trait::async_trait]
pub trait NotificationTransport: Send + Sync {
    fn channel(&self) -> Channel;

    fn provider(&self) -> &'static str;

    async fn send(&self, recipient: &str, message: &RenderedMessage) -> Result<DeliveryReceipt>;
}

pub fn format_amount(amount_minor: i64, currency: &str) -> String {
    format!("{} {:.2}", currency.to_uppercase(), amount_minor as f64 / 100.0)
}

pub fn build_recovery_url(public_base_url: &str, token: &str) -> String {
    format!("{}/pay/{}", public_base_url.trim_end_matches('/'), token)
}

/// Channel content for one outreach. `payment_link` is the processor-hosted
/// link when the transaction has one, otherwise the generic recovery URL.
pub fn render(
    channel: Channel,
    payment_link: &str,
    amount: Option<(i64, &str)>,
) -> RenderedMessage {
    match channel {
        Channel::Email => render_email(payment_link, amount),
        Channel::Sms | Channel::Whatsapp => render_sms(payment_link, amount),
    }
}

fn render_email(payment_link: &str, amount: Option<(i64, &str)>) -> RenderedMessage {
    let amount_line = amount
        .map(|(minor, cur)| {
            format!(
                "<p><strong>Amount:</strong> {}</p>",
                format_amount(minor, cur)
            )
        })
        .unwrap_or_default();
    let body = format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2>Payment Recovery</h2>
  <p>We noticed your recent payment couldn't be completed.</p>
  {amount_line}
  <p>Click the button below to complete your payment securely:</p>
  <div style="margin: 30px 0;">
    <a href="{payment_link}" style="background-color: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; display: inline-block;">Complete Payment</a>
  </div>
  <p style="color: #64748b; font-size: 14px;">If you have questions, please contact our support team.</p>
</body>
</html>"#
    );
    RenderedMessage {
        subject: "Complete Your Payment".to_string(),
        body,
    }
}

fn render_sms(payment_link: &str, amount: Option<(i64, &str)>) -> RenderedMessage {
    let body = match amount {
        Some((minor, cur)) => format!(
            "Complete your {} payment: {}",
            format_amount(minor, cur),
            payment_link
        ),
        None => format!("Complete your payment: {payment_link}"),
    };
    RenderedMessage {
        subject: String::new(),
        body,
    }
}
