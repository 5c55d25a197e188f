use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Whatsapp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Whatsapp => "whatsapp",
        }
    }

    pub fn parse(s: &str) -> Option<Channel> {
        match s {
            "email" => Some(Channel::Email),
            "sms" => Some(Channel::Sms),
            "whatsapp" => Some(Channel::Whatsapp),
            _ => None,
        }
    }
}

/// Closed status set for a recovery attempt. Transitions are monotonic through
/// the table in `can_transition`; terminal states absorb everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Created,
    Sent,
    Opened,
    Completed,
    Expired,
    Cancelled,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Created => "created",
            AttemptStatus::Sent => "sent",
            AttemptStatus::Opened => "opened",
            AttemptStatus::Completed => "completed",
            AttemptStatus::Expired => "expired",
            AttemptStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<AttemptStatus> {
        match s {
            "created" => Some(AttemptStatus::Created),
            "sent" => Some(AttemptStatus::Sent),
            "opened" => Some(AttemptStatus::Opened),
            "completed" => Some(AttemptStatus::Completed),
            "expired" => Some(AttemptStatus::Expired),
            "cancelled" => Some(AttemptStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptStatus::Completed | AttemptStatus::Expired | AttemptStatus::Cancelled
        )
    }
}

/// Exhaustive transition table. Forward skips are legal (a webhook can
/// complete an attempt the customer never opened); nothing leaves a terminal
/// state.
pub fn can_transition(from: AttemptStatus, to: AttemptStatus) -> bool {
    use AttemptStatus::*;
    match (from, to) {
        (Created, Sent) | (Created, Opened) | (Created, Completed) => true,
        (Sent, Opened) | (Sent, Completed) => true,
        (Opened, Completed) => true,
        // re-marking sent after another dispatch pass is a legal self-edge
        (Sent, Sent) => true,
        (Created | Sent | Opened, Expired) => true,
        (Created | Sent | Opened, Cancelled) => true,
        (Completed | Expired | Cancelled, _) => false,
        _ => false,
    }
}

/// Statuses a scheduler pass may still act on.
pub fn retryable_statuses() -> [AttemptStatus; 2] {
    [AttemptStatus::Created, AttemptStatus::Sent]
}

const TOKEN_BYTES: usize = 24;

/// URL-safe token with 192 bits of entropy; collision probability is treated
/// as negligible, uniqueness is still enforced by the column constraint.
pub fn generate_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptRow {
    pub id: i64,
    pub transaction_id: i64,
    pub transaction_ref: String,
    pub channel: Channel,
    pub token: String,
    pub status: AttemptStatus,
    pub expires_at: DateTime<Utc>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub last_retry_at: Option<DateTime<Utc>>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AttemptRow {
    /// Expiry is derived from the stored timestamp on every read, not from a
    /// background sweep having flipped the status yet.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == AttemptStatus::Expired
            || (now > self.expires_at && !self.status.is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_absorb() {
        for terminal in [AttemptStatus::Completed, AttemptStatus::Expired, AttemptStatus::Cancelled] {
            for to in [
                AttemptStatus::Created,
                AttemptStatus::Sent,
                AttemptStatus::Opened,
                AttemptStatus::Completed,
                AttemptStatus::Expired,
                AttemptStatus::Cancelled,
            ] {
                assert!(!can_transition(terminal, to), "{terminal:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn forward_edges_allowed() {
        assert!(can_transition(AttemptStatus::Created, AttemptStatus::Sent));
        assert!(can_transition(AttemptStatus::Sent, AttemptStatus::Opened));
        assert!(can_transition(AttemptStatus::Opened, AttemptStatus::Completed));
        assert!(can_transition(AttemptStatus::Created, AttemptStatus::Completed));
    }

    #[test]
    fn no_backward_edges() {
        assert!(!can_transition(AttemptStatus::Opened, AttemptStatus::Sent));
        assert!(!can_transition(AttemptStatus::Sent, AttemptStatus::Created));
    }

    #[test]
    fn tokens_are_urlsafe_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
