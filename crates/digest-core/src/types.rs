use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Conversation key used when a record carries no `chatId`.
pub const UNKNOWN_CHAT: &str = "unknown";

/// Label used when a contact has no display name.
pub const UNKNOWN_SENDER: &str = "unknown";

/// Wire form of a captured message, as written by the ingestion side.
///
/// Every field is optional; [`Message::from`] applies the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Seconds since the Unix epoch. Numeric strings are accepted.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_me: Option<bool>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stamp {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Option::<Stamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Stamp::Int(secs)) => Ok(Some(secs)),
        Some(Stamp::Float(secs)) => Ok(Some(secs.trunc() as i64)),
        Some(Stamp::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", text, e))),
    }
}

/// Message type tag. The set is open: unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    Chat,
    /// Voice note.
    Ptt,
    Image,
    Document,
    Other(String),
}

impl MessageKind {
    /// Types shown in the per-conversation breakdown, in display order.
    pub const TRACKED: [MessageKind; 4] = [
        MessageKind::Chat,
        MessageKind::Ptt,
        MessageKind::Image,
        MessageKind::Document,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Chat => "chat",
            MessageKind::Ptt => "ptt",
            MessageKind::Image => "image",
            MessageKind::Document => "document",
            MessageKind::Other(tag) => tag,
        }
    }
}

impl From<String> for MessageKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "" | "chat" => MessageKind::Chat,
            "ptt" => MessageKind::Ptt,
            "image" => MessageKind::Image,
            "document" => MessageKind::Document,
            _ => MessageKind::Other(tag),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by the automated agent (`fromMe == true`).
    Agent,
    /// Received from the human contact.
    Contact,
}

/// A captured chat message with all defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub chat_id: String,
    pub id: String,
    /// Seconds since the Unix epoch; `None` when the capture had no timestamp.
    pub timestamp: Option<i64>,
    pub iso_timestamp: String,
    pub sender_name: String,
    pub kind: MessageKind,
    pub body: String,
    pub from_me: bool,
}

impl Message {
    pub fn direction(&self) -> Direction {
        if self.from_me {
            Direction::Agent
        } else {
            Direction::Contact
        }
    }

    /// Sort key: unknown timestamps order before every known one.
    pub fn sort_key(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }

    /// Display name of the sender, `"unknown"` when absent.
    pub fn sender_label(&self) -> &str {
        if self.sender_name.trim().is_empty() {
            UNKNOWN_SENDER
        } else {
            &self.sender_name
        }
    }
}

impl From<RawMessage> for Message {
    fn from(raw: RawMessage) -> Self {
        Self {
            chat_id: raw
                .chat_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| UNKNOWN_CHAT.to_string()),
            id: raw.id.unwrap_or_default(),
            timestamp: raw.timestamp,
            iso_timestamp: raw.iso_timestamp.unwrap_or_default(),
            sender_name: raw.sender_name.unwrap_or_default(),
            kind: raw.kind.map(MessageKind::from).unwrap_or(MessageKind::Chat),
            body: raw.body.unwrap_or_default(),
            from_me: raw.from_me.unwrap_or(false),
        }
    }
}

/// All messages sharing one `chat_id`, stably ordered by timestamp.
///
/// Never empty: [`Conversation::new`] refuses an empty message list.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    chat_id: String,
    messages: Vec<Message>,
}

impl Conversation {
    /// Build a conversation, sorting messages by timestamp. Equal timestamps
    /// keep their input order. Returns `None` for an empty list.
    pub fn new(chat_id: impl Into<String>, mut messages: Vec<Message>) -> Option<Self> {
        if messages.is_empty() {
            return None;
        }
        messages.sort_by_key(Message::sort_key);
        Some(Self {
            chat_id: chat_id.into(),
            messages,
        })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn first(&self) -> &Message {
        &self.messages[0]
    }

    pub fn last(&self) -> &Message {
        &self.messages[self.messages.len() - 1]
    }

    /// Waiting on the agent: the most recent message came from the contact.
    pub fn is_pending(&self) -> bool {
        !self.last().from_me
    }

    /// First message received from the contact, if any.
    pub fn first_received(&self) -> Option<&Message> {
        self.messages.iter().find(|m| !m.from_me)
    }

    /// Short display label: `"<sender> (<short id>)"`, or the agent label
    /// when the contact never wrote.
    pub fn contact_label(&self, agent_label: &str) -> String {
        let short = short_chat_id(&self.chat_id);
        match self.first_received() {
            Some(msg) => format!("{} ({})", msg.sender_label(), short),
            None => format!("{} ({})", agent_label, short),
        }
    }
}

/// Abbreviate long chat ids to `first8...last8`.
pub fn short_chat_id(chat_id: &str) -> String {
    let chars: Vec<char> = chat_id.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        chat_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(chat: &str, ts: Option<i64>, from_me: bool, body: &str) -> Message {
        Message::from(RawMessage {
            chat_id: Some(chat.into()),
            timestamp: ts,
            sender_name: Some("Alice".into()),
            body: Some(body.into()),
            from_me: Some(from_me),
            ..Default::default()
        })
    }

    #[test]
    fn test_raw_defaults() {
        let message = Message::from(RawMessage::default());
        assert_eq!(message.chat_id, UNKNOWN_CHAT);
        assert_eq!(message.kind, MessageKind::Chat);
        assert_eq!(message.body, "");
        assert!(!message.from_me);
        assert!(message.timestamp.is_none());
        assert_eq!(message.sender_label(), "unknown");
    }

    #[test]
    fn test_raw_deserializes_camel_case() {
        let json = r#"{"chatId":"c1","id":"m1","timestamp":10,"isoTimestamp":"2024-01-01T00:00:10Z",
            "senderName":"Bob","type":"ptt","body":"","fromMe":true}"#;
        let raw: RawMessage = serde_json::from_str(json).unwrap();
        let message = Message::from(raw);
        assert_eq!(message.chat_id, "c1");
        assert_eq!(message.kind, MessageKind::Ptt);
        assert_eq!(message.direction(), Direction::Agent);
        assert_eq!(message.iso_timestamp, "2024-01-01T00:00:10Z");
    }

    #[test]
    fn test_timestamp_accepts_numeric_strings() {
        let raw: RawMessage = serde_json::from_str(r#"{"timestamp":" 1700000000 "}"#).unwrap();
        assert_eq!(raw.timestamp, Some(1_700_000_000));
        let raw: RawMessage = serde_json::from_str(r#"{"timestamp":12.9}"#).unwrap();
        assert_eq!(raw.timestamp, Some(12));
        let raw: RawMessage = serde_json::from_str(r#"{"timestamp":null}"#).unwrap();
        assert_eq!(raw.timestamp, None);
        assert!(serde_json::from_str::<RawMessage>(r#"{"timestamp":"soon"}"#).is_err());
    }

    #[test]
    fn test_unknown_kind_is_kept() {
        let kind = MessageKind::from("sticker".to_string());
        assert_eq!(kind, MessageKind::Other("sticker".into()));
        assert_eq!(kind.to_string(), "sticker");
    }

    #[test]
    fn test_conversation_rejects_empty() {
        assert!(Conversation::new("c1", Vec::new()).is_none());
    }

    #[test]
    fn test_conversation_sort_is_stable() {
        let conv = Conversation::new(
            "c1",
            vec![
                msg("c1", Some(20), true, "late"),
                msg("c1", Some(10), false, "first"),
                msg("c1", Some(10), true, "second"),
                msg("c1", None, false, "unknown"),
            ],
        )
        .unwrap();
        let bodies: Vec<&str> = conv.messages().iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["unknown", "first", "second", "late"]);
        assert!(!conv.is_pending());
    }

    #[test]
    fn test_pending_when_contact_wrote_last() {
        let conv = Conversation::new(
            "c1",
            vec![msg("c1", Some(1), true, "hi"), msg("c1", Some(2), false, "?")],
        )
        .unwrap();
        assert!(conv.is_pending());
    }

    #[test]
    fn test_short_chat_id() {
        assert_eq!(short_chat_id("chat1"), "chat1");
        assert_eq!(short_chat_id("123456789012"), "123456789012");
        assert_eq!(
            short_chat_id("5511999998888@c.us"),
            "55119999...8888@c.us"
        );
    }

    #[test]
    fn test_contact_label() {
        let conv = Conversation::new("chat1", vec![msg("chat1", Some(1), false, "oi")]).unwrap();
        assert_eq!(conv.contact_label("BOT"), "Alice (chat1)");

        let outbound = Conversation::new("chat2", vec![msg("chat2", Some(1), true, "oi")]).unwrap();
        assert_eq!(outbound.contact_label("BOT"), "BOT (chat2)");
    }
}
