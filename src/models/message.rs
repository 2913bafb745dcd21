/// Chat message model for room conversations.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        MessageId(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Reaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Client-generated id. Messages from older clients omit it or send a
    /// counter; those carry no id here and are never treated as echoes.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_id"
    )]
    pub id: Option<MessageId>,
    pub sender: String,
    pub text: String,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
}

impl ChatMessage {
    /// Create a new outgoing text message
    pub fn text(sender: &str, text: &str) -> Self {
        Self::compose(sender, text, MessageKind::Text)
    }

    /// Create a new outgoing reaction (a single emoji)
    pub fn reaction(sender: &str, emoji: &str) -> Self {
        Self::compose(sender, emoji, MessageKind::Reaction)
    }

    fn compose(sender: &str, text: &str, kind: MessageKind) -> Self {
        ChatMessage {
            id: Some(MessageId::new()),
            sender: sender.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Hour and minute, as shown next to each transcript line
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<MessageId>, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(MessageId))
}

/// Accepts RFC 3339 strings or epoch milliseconds; anything else is stamped
/// with the arrival time.
fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    let parsed = match raw {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(Utc::now))
}
