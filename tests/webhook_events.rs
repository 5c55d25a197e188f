use hmac::{Hmac, Mac};
use revenue_recovery::psp::{parse_event, verify_signature};
use sha2::Sha256;

fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[test]
fn valid_signature_verifies() {
    let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
    let sig = sign(payload, "whsec_test");
    assert!(verify_signature(payload, &sig, "whsec_test"));
}

#[test]
fn signature_with_surrounding_whitespace_still_verifies() {
    let payload = b"{}";
    let sig = format!("  {}  ", sign(payload, "s3cret"));
    assert!(verify_signature(payload, &sig, "s3cret"));
}

#[test]
fn tampered_payload_fails_verification() {
    let payload = br#"{"id":"evt_1","amount":100}"#;
    let sig = sign(payload, "whsec_test");
    let tampered = br#"{"id":"evt_1","amount":999}"#;
    assert!(!verify_signature(tampered, &sig, "whsec_test"));
}

#[test]
fn wrong_secret_fails_verification() {
    let payload = b"{}";
    let sig = sign(payload, "whsec_test");
    assert!(!verify_signature(payload, &sig, "whsec_other"));
}

#[test]
fn non_hex_signature_fails_verification() {
    assert!(!verify_signature(b"{}", "not-hex-at-all", "whsec_test"));
}

#[test]
fn empty_secret_never_verifies() {
    let payload = b"{}";
    let sig = sign(payload, "");
    assert!(!verify_signature(payload, &sig, ""));
}

#[test]
fn checkout_session_event_extracts_order_and_merchant_ref() {
    let raw = br#"{
        "id": "evt_123",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test_abc",
                "payment_intent": "pi_456",
                "metadata": { "transaction_ref": "TXN-001" }
            }
        }
    }"#;
    let event = parse_event(raw).unwrap();
    assert_eq!(event.event_id, "evt_123");
    assert_eq!(event.event_type, "checkout.session.completed");
    assert_eq!(event.order_id.as_deref(), Some("cs_test_abc"));
    assert_eq!(event.payment_id.as_deref(), Some("pi_456"));
    assert_eq!(event.merchant_ref.as_deref(), Some("TXN-001"));
    assert!(event.is_success());
    assert_eq!(event.external_id(), Some("evt_123"));
}

#[test]
fn payment_captured_event_uses_object_id_as_payment_id() {
    let raw = br#"{
        "id": "evt_9",
        "type": "payment.captured",
        "data": { "object": { "id": "pay_777", "order_id": "order_42", "receipt": "TXN-002" } }
    }"#;
    let event = parse_event(raw).unwrap();
    assert_eq!(event.payment_id.as_deref(), Some("pay_777"));
    assert_eq!(event.order_id.as_deref(), Some("order_42"));
    assert_eq!(event.merchant_ref.as_deref(), Some("TXN-002"));
    assert!(event.is_success());
}

#[test]
fn razorpay_envelope_normalizes_to_the_same_view() {
    let raw = br#"{
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": "pay_razor1",
                    "order_id": "order_razor1",
                    "notes": { "transaction_ref": "TXN-003" }
                }
            }
        }
    }"#;
    let event = parse_event(raw).unwrap();
    assert_eq!(event.event_type, "payment.captured");
    assert_eq!(event.payment_id.as_deref(), Some("pay_razor1"));
    assert_eq!(event.order_id.as_deref(), Some("order_razor1"));
    assert_eq!(event.merchant_ref.as_deref(), Some("TXN-003"));
    assert!(event.is_success());
    // no top-level event id: identity falls back to the payment id
    assert_eq!(event.external_id(), Some("pay_razor1"));
}

#[test]
fn razorpay_order_paid_resolves_through_the_order_entity() {
    let raw = br#"{
        "event": "order.paid",
        "payload": {
            "order": {
                "entity": { "id": "order_razor2", "receipt": "TXN-004" }
            }
        }
    }"#;
    let event = parse_event(raw).unwrap();
    assert_eq!(event.event_type, "order.paid");
    assert_eq!(event.merchant_ref.as_deref(), Some("TXN-004"));
    assert!(event.is_success());
    assert_eq!(event.external_id(), Some("order_razor2"));
}

#[test]
fn failure_events_are_not_success() {
    let raw = br#"{"id":"evt_2","type":"payment_intent.payment_failed","data":{"object":{"id":"pi_1"}}}"#;
    let event = parse_event(raw).unwrap();
    assert!(!event.is_success());
}

#[test]
fn external_id_falls_back_to_payment_then_order_id() {
    let raw = br#"{"type":"payment.captured","data":{"object":{"id":"pay_1","order_id":"order_1"}}}"#;
    let event = parse_event(raw).unwrap();
    assert_eq!(event.external_id(), Some("pay_1"));

    let raw = br#"{"type":"order.paid","data":{"object":{"order_id":"order_1"}}}"#;
    let event = parse_event(raw).unwrap();
    assert_eq!(event.external_id(), Some("order_1"));

    let raw = br#"{"type":"order.paid","data":{"object":{}}}"#;
    let event = parse_event(raw).unwrap();
    assert_eq!(event.external_id(), None);
}

#[test]
fn malformed_json_is_rejected() {
    assert!(parse_event(b"not json").is_err());
}
