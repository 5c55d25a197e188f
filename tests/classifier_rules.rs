use revenue_recovery::classifier::{
    classify, FailureCategory, Hardness, RetryRecommendation,
};

#[test]
fn insufficient_funds_is_soft_wait_and_retry() {
    let c = classify(Some("insufficient_funds"), None);
    assert_eq!(c.category, FailureCategory::Funds);
    assert_eq!(c.hardness, Hardness::Soft);
    assert_eq!(c.recommendation, RetryRecommendation::WaitAndRetry);
    assert!(c.cooldown_seconds.is_some());
}

#[test]
fn issuer_decline_is_hard_do_not_retry() {
    for code in ["issuer_declined", "do_not_honor", "card_declined", "account_closed"] {
        let c = classify(Some(code), None);
        assert_eq!(c.category, FailureCategory::IssuerDecline, "code {code}");
        assert_eq!(c.hardness, Hardness::Hard, "code {code}");
        assert_eq!(c.recommendation, RetryRecommendation::DoNotRetry, "code {code}");
        assert!(c.alternate_channels.is_empty(), "code {code}");
    }
}

#[test]
fn gateway_prefixes_are_stripped_before_matching() {
    let plain = classify(Some("insufficient_funds"), None);
    for prefixed in [
        "RZP_insufficient_funds",
        "RZP001_insufficient_funds",
        "STRIPE_insufficient_funds",
        "adyen_insufficient_funds",
    ] {
        let c = classify(Some(prefixed), None);
        assert_eq!(c.category, plain.category, "code {prefixed}");
        assert_eq!(c.recommendation, plain.recommendation, "code {prefixed}");
    }
}

#[test]
fn code_matching_is_case_insensitive() {
    let c = classify(Some("INSUFFICIENT_FUNDS"), None);
    assert_eq!(c.category, FailureCategory::Funds);
}

#[test]
fn auth_timeouts_retry_on_the_same_channel() {
    for code in ["auth_timeout", "3ds_timeout", "otp_timeout"] {
        let c = classify(Some(code), None);
        assert_eq!(c.category, FailureCategory::AuthTimeout, "code {code}");
        assert_eq!(c.recommendation, RetryRecommendation::RetrySame, "code {code}");
    }
}

#[test]
fn upi_pending_waits() {
    let c = classify(Some("upi_pending"), None);
    assert_eq!(c.category, FailureCategory::UpiPending);
    assert_eq!(c.recommendation, RetryRecommendation::WaitAndRetry);
}

#[test]
fn message_is_consulted_when_the_code_is_unrecognized() {
    let c = classify(Some("e999"), Some("transaction declined by issuing bank"));
    assert_eq!(c.category, FailureCategory::IssuerDecline);

    let c = classify(None, Some("insufficient balance in account"));
    assert_eq!(c.category, FailureCategory::Funds);

    let c = classify(None, Some("gateway timeout while contacting bank"));
    assert_eq!(c.category, FailureCategory::Network);
}

#[test]
fn unrecognized_input_falls_back_to_soft_unknown() {
    for (code, message) in [
        (None, None),
        (Some("e999"), None),
        (Some("zzz"), Some("something opaque happened")),
    ] {
        let c = classify(code, message);
        assert_eq!(c.category, FailureCategory::Unknown);
        assert_eq!(c.hardness, Hardness::Soft);
        assert_eq!(c.recommendation, RetryRecommendation::WaitAndRetry);
    }
}

#[test]
fn identical_inputs_classify_identically() {
    let a = classify(Some("network_error"), Some("tcp reset"));
    let b = classify(Some("network_error"), Some("tcp reset"));
    assert_eq!(a.category, b.category);
    assert_eq!(a.hardness, b.hardness);
    assert_eq!(a.recommendation, b.recommendation);
    assert_eq!(a.alternate_channels, b.alternate_channels);
    assert_eq!(a.cooldown_seconds, b.cooldown_seconds);
}
