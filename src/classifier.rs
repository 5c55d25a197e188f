use serde::{Deserialize, Serialize};

use crate::domain::attempt::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Funds,
    IssuerDecline,
    AuthTimeout,
    UpiPending,
    Network,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hardness {
    Soft,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryRecommendation {
    RetrySame,
    RetryAlternateChannel,
    WaitAndRetry,
    DoNotRetry,
}

#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub category: FailureCategory,
    pub hardness: Hardness,
    pub recommendation: RetryRecommendation,
    pub alternate_channels: Vec<Channel>,
    pub cooldown_seconds: Option<u32>,
}

/// Maps a processor failure code/message pair to a category and retry
/// recommendation. Total and deterministic: identical inputs always produce
/// identical outputs, and absent or unrecognized input falls back to the
/// conservative default.
pub fn classify(code: Option<&str>, message: Option<&str>) -> Classification {
    if let Some(code) = code {
        let normalized = normalize_code(code);
        if let Some(category) = match_code(&normalized) {
            return build(category);
        }
    }
    if let Some(message) = message {
        if let Some(category) = match_message(message) {
            return build(category);
        }
    }
    build(FailureCategory::Unknown)
}

/// Strips gateway-specific prefixes (e.g. `RZP001_`, `STRIPE_`) and lowercases
/// so the code table stays processor-agnostic.
fn normalize_code(code: &str) -> String {
    let lower = code.trim().to_lowercase();
    for prefix in ["rzp", "stripe", "adyen"] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            // skip any numeric variant suffix on the prefix itself, then the separator
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            if let Some(rest) = rest.strip_prefix('_') {
                return rest.to_string();
            }
        }
    }
    lower
}

fn match_code(normalized: &str) -> Option<FailureCategory> {
    let exact = match normalized {
        "insufficient_funds" | "balance_insufficient" | "card_declined_insufficient_funds" => {
            Some(FailureCategory::Funds)
        }
        "issuer_declined" | "do_not_honor" | "card_declined" | "upi_invalid_vpa"
        | "invalid_account" | "account_closed" => Some(FailureCategory::IssuerDecline),
        "auth_timeout" | "3ds_timeout" | "otp_timeout" | "authentication_timeout" => {
            Some(FailureCategory::AuthTimeout)
        }
        "upi_pending" | "payment_pending" => Some(FailureCategory::UpiPending),
        "network_error" | "gateway_timeout" | "bank_unavailable" | "processing_error" => {
            Some(FailureCategory::Network)
        }
        _ => None,
    };
    if exact.is_some() {
        return exact;
    }
    // prefix fallback for processor code families
    if normalized.starts_with("insufficient") {
        Some(FailureCategory::Funds)
    } else if normalized.starts_with("issuer") || normalized.starts_with("decline") {
        Some(FailureCategory::IssuerDecline)
    } else if normalized.starts_with("timeout") {
        Some(FailureCategory::Network)
    } else {
        None
    }
}

fn match_message(message: &str) -> Option<FailureCategory> {
    let lower = message.to_lowercase();
    if lower.contains("insufficient") || lower.contains("balance") {
        Some(FailureCategory::Funds)
    } else if lower.contains("declined") || lower.contains("do not honor") {
        Some(FailureCategory::IssuerDecline)
    } else if lower.contains("3ds") || lower.contains("otp") || lower.contains("authentication") {
        Some(FailureCategory::AuthTimeout)
    } else if lower.contains("pending") {
        Some(FailureCategory::UpiPending)
    } else if lower.contains("timeout") || lower.contains("network") || lower.contains("unavailable")
    {
        Some(FailureCategory::Network)
    } else {
        None
    }
}

fn build(category: FailureCategory) -> Classification {
    match category {
        FailureCategory::Funds => Classification {
            category,
            hardness: Hardness::Soft,
            recommendation: RetryRecommendation::WaitAndRetry,
            alternate_channels: vec![Channel::Email, Channel::Sms],
            cooldown_seconds: Some(6 * 3600),
        },
        FailureCategory::IssuerDecline => Classification {
            category,
            hardness: Hardness::Hard,
            recommendation: RetryRecommendation::DoNotRetry,
            alternate_channels: vec![],
            cooldown_seconds: None,
        },
        FailureCategory::AuthTimeout => Classification {
            category,
            hardness: Hardness::Soft,
            recommendation: RetryRecommendation::RetrySame,
            alternate_channels: vec![Channel::Sms],
            cooldown_seconds: Some(300),
        },
        FailureCategory::UpiPending => Classification {
            category,
            hardness: Hardness::Soft,
            recommendation: RetryRecommendation::WaitAndRetry,
            alternate_channels: vec![],
            cooldown_seconds: Some(600),
        },
        FailureCategory::Network => Classification {
            category,
            hardness: Hardness::Soft,
            recommendation: RetryRecommendation::RetrySame,
            alternate_channels: vec![Channel::Email],
            cooldown_seconds: Some(120),
        },
        FailureCategory::Unknown => Classification {
            category,
            hardness: Hardness::Soft,
            recommendation: RetryRecommendation::WaitAndRetry,
            alternate_channels: vec![Channel::Email],
            cooldown_seconds: None,
        },
    }
}
