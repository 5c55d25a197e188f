use revenue_recovery::domain::attempt::Channel;
use revenue_recovery::notify::mock::MockTransport;
use revenue_recovery::notify::{NotificationTransport, RenderedMessage};
use revenue_recovery::psp::mock::MockPsp;
use revenue_recovery::psp::{ExternalPaymentStatus, PspClient};

#[tokio::test]
async fn mock_psp_reports_the_configured_status() {
    let paid = MockPsp { behavior: "ALWAYS_PAID".to_string() };
    let unknown = MockPsp { behavior: "ALWAYS_UNKNOWN".to_string() };
    let open = MockPsp { behavior: String::new() };

    assert!(paid.is_configured());
    assert_eq!(paid.fetch_status("cs_1").await.unwrap(), ExternalPaymentStatus::Paid);
    assert_eq!(unknown.fetch_status("cs_1").await.unwrap(), ExternalPaymentStatus::Unknown);
    assert_eq!(open.fetch_status("cs_1").await.unwrap(), ExternalPaymentStatus::Open);
}

#[tokio::test]
async fn mock_psp_handle_is_deterministic_per_reference() {
    let psp = MockPsp { behavior: String::new() };
    let a = psp.create_payment_handle(1000, "usd", "TXN-1").await.unwrap();
    let b = psp.create_payment_handle(1000, "usd", "TXN-1").await.unwrap();
    assert_eq!(a.handle_id, b.handle_id);
    assert_eq!(a.handle_id, "cs_mock_TXN-1");
    assert!(a.url.unwrap().ends_with("/TXN-1"));
}

#[tokio::test]
async fn mock_transport_honors_failure_behavior() {
    let message = RenderedMessage {
        subject: "s".to_string(),
        body: "b".to_string(),
    };

    let ok = MockTransport {
        channel: Channel::Email,
        behavior: String::new(),
    };
    let receipt = ok.send("a@b.test", &message).await.unwrap();
    assert_eq!(receipt.provider, "mock");
    assert!(receipt.provider_message_id.is_some());

    let failing = MockTransport {
        channel: Channel::Sms,
        behavior: "ALWAYS_FAILURE".to_string(),
    };
    assert!(failing.send("+10000000000", &message).await.is_err());
    assert_eq!(failing.channel(), Channel::Sms);
}
