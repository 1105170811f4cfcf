//! Canonical input for the analytics engine.
//!
//! Message collections arrive either flat (one array of records, each with a
//! `chatId`) or pre-grouped (an array of `{ chatId, messages }` objects).
//! Both shapes are adapted into [`ChatLog`] once, before any aggregation.

use crate::error::{DigestError, Result};
use crate::types::{Conversation, Message, RawMessage, UNKNOWN_CHAT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One pre-grouped conversation as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

/// A complete, in-memory message collection in one of the two accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatLog {
    Flat(Vec<Message>),
    Grouped(Vec<ConversationInput>),
}

impl Default for ChatLog {
    fn default() -> Self {
        ChatLog::Flat(Vec::new())
    }
}

impl ChatLog {
    /// Adapt a parsed JSON document.
    ///
    /// An array whose first element carries `messages` is grouped; any other
    /// array is flat. Elements that are not objects are skipped. A non-array
    /// document is a caller bug and fails with [`DigestError::InputShape`].
    pub fn from_value(value: Value) -> Result<Self> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(DigestError::InputShape(format!(
                    "expected a JSON array of messages or conversations, got {}",
                    json_kind(&other)
                )))
            }
        };

        let grouped = items
            .first()
            .and_then(Value::as_object)
            .is_some_and(|obj| obj.contains_key("messages"));

        if grouped {
            let groups = items
                .into_iter()
                .enumerate()
                .filter_map(|(idx, item)| parse_group(idx, item))
                .collect();
            Ok(ChatLog::Grouped(groups))
        } else {
            let messages = items
                .into_iter()
                .enumerate()
                .filter_map(|(idx, item)| parse_record(idx, item))
                .map(Message::from)
                .collect();
            Ok(ChatLog::Flat(messages))
        }
    }

    /// Parse a JSON document from text.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Group into conversations.
    ///
    /// Flat input is grouped by `chat_id` in first-seen order. Grouped input
    /// keeps its order; groups sharing an id are merged and empty groups are
    /// dropped. Each conversation is sorted by timestamp.
    pub fn conversations(&self) -> Vec<Conversation> {
        let mut order: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Vec<Message>> = HashMap::new();

        let mut push = |chat_id: String, message: Message| {
            if !buckets.contains_key(&chat_id) {
                order.push(chat_id.clone());
            }
            buckets.entry(chat_id).or_default().push(message);
        };

        match self {
            ChatLog::Flat(messages) => {
                for message in messages {
                    push(message.chat_id.clone(), message.clone());
                }
            }
            ChatLog::Grouped(groups) => {
                for group in groups {
                    let chat_id = group
                        .chat_id
                        .clone()
                        .filter(|id| !id.is_empty())
                        .or_else(|| {
                            group
                                .messages
                                .first()
                                .and_then(|m| m.chat_id.clone())
                                .filter(|id| !id.is_empty())
                        })
                        .unwrap_or_else(|| UNKNOWN_CHAT.to_string());
                    for raw in &group.messages {
                        let mut message = Message::from(raw.clone());
                        message.chat_id = chat_id.clone();
                        push(chat_id.clone(), message);
                    }
                }
            }
        }

        order
            .into_iter()
            .filter_map(|chat_id| {
                let messages = buckets.remove(&chat_id)?;
                Conversation::new(chat_id, messages)
            })
            .collect()
    }

    /// Total number of messages across all conversations.
    pub fn message_count(&self) -> usize {
        match self {
            ChatLog::Flat(messages) => messages.len(),
            ChatLog::Grouped(groups) => groups.iter().map(|g| g.messages.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.message_count() == 0
    }
}

impl From<Vec<Message>> for ChatLog {
    fn from(messages: Vec<Message>) -> Self {
        ChatLog::Flat(messages)
    }
}

/// A group is parsed message by message so one bad record costs only itself.
/// A bare string inside `messages` is a received message with that body.
fn parse_group(idx: usize, item: Value) -> Option<ConversationInput> {
    let mut obj = match item {
        Value::Object(obj) => obj,
        other => {
            tracing::warn!("Skipping non-object conversation #{}: {}", idx, json_kind(&other));
            return None;
        }
    };
    let chat_id = obj.get("chatId").and_then(Value::as_str).map(str::to_string);
    let items = match obj.remove("messages") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!(
                "Skipping conversation #{}: messages is {}, not an array",
                idx,
                json_kind(&other)
            );
            return None;
        }
        None => Vec::new(),
    };
    let messages = items
        .into_iter()
        .enumerate()
        .filter_map(|(msg_idx, item)| match item {
            Value::String(body) => Some(RawMessage {
                body: Some(body),
                ..Default::default()
            }),
            other => parse_record(msg_idx, other),
        })
        .collect();
    Some(ConversationInput { chat_id, messages })
}

fn parse_record(idx: usize, item: Value) -> Option<RawMessage> {
    if !item.is_object() {
        tracing::warn!("Skipping non-object message #{}: {}", idx, json_kind(&item));
        return None;
    }
    match serde_json::from_value::<RawMessage>(item) {
        Ok(raw) => Some(raw),
        Err(e) => {
            tracing::warn!("Skipping malformed message #{}: {}", idx, e);
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
