use revenue_recovery::domain::attempt::Channel;
use revenue_recovery::notify::{build_recovery_url, format_amount, render};

#[test]
fn amounts_render_as_currency_and_major_units() {
    assert_eq!(format_amount(1234, "usd"), "USD 12.34");
    assert_eq!(format_amount(50000, "INR"), "INR 500.00");
    assert_eq!(format_amount(5, "eur"), "EUR 0.05");
}

#[test]
fn recovery_url_joins_base_and_token() {
    assert_eq!(
        build_recovery_url("https://pay.example.com", "tok123"),
        "https://pay.example.com/pay/tok123"
    );
    // trailing slash on the base must not double up
    assert_eq!(
        build_recovery_url("https://pay.example.com/", "tok123"),
        "https://pay.example.com/pay/tok123"
    );
}

#[test]
fn email_renders_html_with_link_and_amount() {
    let m = render(Channel::Email, "https://pay.example.com/pay/t1", Some((2500, "usd")));
    assert_eq!(m.subject, "Complete Your Payment");
    assert!(m.body.contains("https://pay.example.com/pay/t1"));
    assert!(m.body.contains("USD 25.00"));
    assert!(m.body.contains("<html>"));
}

#[test]
fn email_omits_amount_line_when_amount_is_unknown() {
    let m = render(Channel::Email, "https://x/pay/t", None);
    assert!(!m.body.contains("Amount:"));
    assert!(m.body.contains("https://x/pay/t"));
}

#[test]
fn sms_is_a_single_line_with_the_link() {
    let m = render(Channel::Sms, "https://x/pay/t", Some((1000, "gbp")));
    assert!(m.subject.is_empty());
    assert_eq!(m.body, "Complete your GBP 10.00 payment: https://x/pay/t");

    let m = render(Channel::Sms, "https://x/pay/t", None);
    assert_eq!(m.body, "Complete your payment: https://x/pay/t");
}
