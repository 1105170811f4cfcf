//! Conversation aggregation and global rollups.
//!
//! [`Analyzer::summarize`] is a pure function of its input: conversations are
//! mapped to [`ConversationStats`] independently, then the global rollups are
//! derived from the finished stats. Nothing is carried between calls.

use crate::sentiment::{Polarity, SentimentScorer};
use crate::text::{top_words, Normalizer, KEYWORD_LIMIT};
use crate::themes::ThemeClassifier;
use digest_core::config::AppConfig;
use digest_core::error::Result;
use digest_core::input::ChatLog;
use digest_core::types::{Conversation, Direction, Message, MessageKind};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Size of every top-N ranking in the report.
pub const TOP_N: usize = 3;

/// Response-time samples at or above one week are outliers.
pub const MAX_RESPONSE_SECS: i64 = 7 * 24 * 60 * 60;

/// Longest-message previews are cut to this many characters.
pub const PREVIEW_CHARS: usize = 100;

/// Delay between two consecutive messages that switch direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponseSample {
    /// Direction of the later message, i.e. who responded.
    pub responder: Direction,
    pub seconds: i64,
}

impl ResponseSample {
    /// Positive and under [`MAX_RESPONSE_SECS`].
    pub fn is_valid(&self) -> bool {
        self.seconds > 0 && self.seconds < MAX_RESPONSE_SECS
    }
}

/// Collect response samples from temporally ordered messages.
///
/// Every direction switch between neighbours yields one sample, provided both
/// timestamps are known. Outliers are kept here and filtered when averaging.
pub fn response_samples(messages: &[Message]) -> Vec<ResponseSample> {
    messages
        .windows(2)
        .filter_map(|pair| {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.from_me == next.from_me {
                return None;
            }
            // An overflowing delta is far past any outlier bound.
            let seconds = next.timestamp?.checked_sub(prev.timestamp?)?;
            Some(ResponseSample {
                responder: next.direction(),
                seconds,
            })
        })
        .collect()
}

/// Mean of the valid samples attributed to `responder`.
pub fn mean_response(samples: &[ResponseSample], responder: Direction) -> Option<f64> {
    let valid: Vec<i64> = samples
        .iter()
        .filter(|s| s.responder == responder && s.is_valid())
        .map(|s| s.seconds)
        .collect();
    mean(&valid)
}

fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
    }
}

/// Positive/negative/neutral message counts and the summed score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SentimentTally {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    pub total_score: i64,
}

impl SentimentTally {
    pub fn record(mut self, score: i32) -> Self {
        match Polarity::from_score(score) {
            Polarity::Positive => self.positive += 1,
            Polarity::Negative => self.negative += 1,
            Polarity::Neutral => self.neutral += 1,
        }
        self.total_score += score as i64;
        self
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            positive: self.positive + other.positive,
            negative: self.negative + other.negative,
            neutral: self.neutral + other.neutral,
            total_score: self.total_score + other.total_score,
        }
    }

    pub fn count(&self) -> u32 {
        self.positive + self.negative + self.neutral
    }

    /// Arithmetic mean of the recorded scores, 0.0 when nothing was recorded.
    pub fn mean(&self) -> f64 {
        if self.count() == 0 {
            0.0
        } else {
            self.total_score as f64 / self.count() as f64
        }
    }
}

/// Message counts per type tag, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeTally {
    pub sent: BTreeMap<String, u32>,
    pub received: BTreeMap<String, u32>,
}

impl TypeTally {
    fn record(mut self, message: &Message) -> Self {
        let side = if message.from_me {
            &mut self.sent
        } else {
            &mut self.received
        };
        *side.entry(message.kind.as_str().to_string()).or_insert(0) += 1;
        self
    }

    pub fn sent_count(&self, kind: &MessageKind) -> u32 {
        self.sent.get(kind.as_str()).copied().unwrap_or(0)
    }

    pub fn received_count(&self, kind: &MessageKind) -> u32 {
        self.received.get(kind.as_str()).copied().unwrap_or(0)
    }
}

/// Statistics computed for a single conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationStats {
    pub chat_id: String,
    /// Short contact label, e.g. `"Alice (chat1)"`.
    pub contact: String,
    pub total: u32,
    pub sent: u32,
    pub received: u32,
    /// Share of messages sent by the agent, rounded to a whole percent.
    pub pct_agent: u32,
    pub start: String,
    pub end: String,
    pub types: TypeTally,
    /// Raw samples, outliers included.
    pub response_samples: Vec<ResponseSample>,
    /// Mean agent reply delay over valid samples.
    pub agent_response_mean: Option<f64>,
    /// Mean contact reply delay over valid samples.
    pub contact_response_mean: Option<f64>,
    pub pending: bool,
    /// Who wrote the last message: sender name, or the chat id when unnamed.
    pub last_sender: String,
    pub last_body: String,
    pub last_seen: String,
    pub themes: Vec<String>,
    pub keywords: Vec<String>,
    pub sentiment: SentimentTally,
}

impl ConversationStats {
    /// Ranking signal: plain message count.
    pub fn engagement(&self) -> u32 {
        self.total
    }
}

/// A conversation waiting on the agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingItem {
    pub contact: String,
    /// Sender the pending ranking groups by; spans conversations.
    pub sender: String,
    pub chat_id: String,
    pub last_seen: String,
    pub total: u32,
    pub last_body: String,
}

/// One row of a top-N ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub label: String,
    pub value: T,
}

/// One line of the consolidated timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub timestamp: Option<i64>,
    pub iso_timestamp: String,
    pub sender: String,
    pub recipient: String,
    pub kind: MessageKind,
    pub body: String,
}

/// Everything the report needs, computed once.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub title: String,
    pub agent_label: String,
    pub total_messages: u32,
    pub sent_by_agent: u32,
    pub received: u32,
    pub unique_chats: u32,
    /// Contact labels, sorted.
    pub contacts: Vec<String>,
    pub sentiment: SentimentTally,
    pub conversations: Vec<ConversationStats>,
    pub pending: Vec<PendingItem>,
    pub top_engaged: Vec<Ranked<u32>>,
    /// Highest mean agent reply delays, in seconds.
    pub slowest_responses: Vec<Ranked<f64>>,
    /// Mean of the per-conversation agent means.
    pub overall_response_mean: Option<f64>,
    pub top_pending_contacts: Vec<Ranked<u32>>,
    /// Themes counted once per conversation.
    pub top_themes: Vec<Ranked<u32>>,
    pub longest_received: Option<String>,
    pub longest_sent: Option<String>,
    pub timeline: Vec<TimelineEntry>,
}

/// Analytics engine: text normalization, theme and sentiment classification,
/// and aggregation. Immutable once built.
#[derive(Debug, Clone)]
pub struct Analyzer {
    normalizer: Normalizer,
    themes: ThemeClassifier,
    scorer: SentimentScorer,
    agent_label: String,
    title: String,
}

impl Analyzer {
    pub fn new(normalizer: Normalizer, themes: ThemeClassifier, scorer: SentimentScorer) -> Self {
        let report = digest_core::config::ReportConfig::default();
        Self {
            normalizer,
            themes,
            scorer,
            agent_label: report.agent_label,
            title: report.title,
        }
    }

    /// Build from application config. Fails if a theme trigger is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            Normalizer::from_config(&config.analysis),
            ThemeClassifier::from_config(&config.analysis)?,
            SentimentScorer::from_config(&config.sentiment),
        )
        .with_agent_label(config.report.agent_label.clone())
        .with_title(config.report.title.clone()))
    }

    pub fn with_agent_label(mut self, label: impl Into<String>) -> Self {
        self.agent_label = label.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn agent_label(&self) -> &str {
        &self.agent_label
    }

    /// Aggregate a message collection.
    pub fn summarize(&self, log: &ChatLog) -> ChatSummary {
        let conversations = log.conversations();
        let stats: Vec<ConversationStats> = conversations
            .iter()
            .map(|conv| self.conversation_stats(conv))
            .collect();

        let total_messages = stats.iter().map(|s| s.total).sum();
        let sent_by_agent = stats.iter().map(|s| s.sent).sum();
        let received = stats.iter().map(|s| s.received).sum();
        let sentiment = stats
            .iter()
            .fold(SentimentTally::default(), |acc, s| acc.merge(s.sentiment));

        let mut contacts: Vec<String> = stats.iter().map(|s| s.contact.clone()).collect();
        contacts.sort();

        let pending: Vec<PendingItem> = stats
            .iter()
            .filter(|s| s.pending)
            .map(|s| PendingItem {
                contact: s.contact.clone(),
                sender: s.last_sender.clone(),
                chat_id: s.chat_id.clone(),
                last_seen: s.last_seen.clone(),
                total: s.total,
                last_body: s.last_body.clone(),
            })
            .collect();

        let top_engaged = top_n(
            stats
                .iter()
                .map(|s| Ranked {
                    label: s.contact.clone(),
                    value: s.engagement(),
                })
                .collect(),
        );

        let agent_means: Vec<Ranked<f64>> = stats
            .iter()
            .filter_map(|s| {
                s.agent_response_mean.map(|value| Ranked {
                    label: s.contact.clone(),
                    value,
                })
            })
            .collect();
        let overall_response_mean = if agent_means.is_empty() {
            None
        } else {
            Some(agent_means.iter().map(|r| r.value).sum::<f64>() / agent_means.len() as f64)
        };
        let slowest_responses = top_n(agent_means);

        let top_pending_contacts = top_n(count_in_order(pending.iter().map(|p| p.sender.as_str())));
        let top_themes = top_n(count_in_order(
            stats.iter().flat_map(|s| s.themes.iter().map(String::as_str)),
        ));

        let all_messages = || conversations.iter().flat_map(|c| c.messages());
        let longest_received = longest_body(all_messages().filter(|m| !m.from_me));
        let longest_sent = longest_body(all_messages().filter(|m| m.from_me));

        let timeline = self.timeline(&conversations, &stats);

        tracing::debug!(
            "Summarized {} messages across {} conversations ({} pending)",
            total_messages,
            stats.len(),
            pending.len()
        );

        ChatSummary {
            title: self.title.clone(),
            agent_label: self.agent_label.clone(),
            total_messages,
            sent_by_agent,
            received,
            unique_chats: stats.len() as u32,
            contacts,
            sentiment,
            conversations: stats,
            pending,
            top_engaged,
            slowest_responses,
            overall_response_mean,
            top_pending_contacts,
            top_themes,
            longest_received,
            longest_sent,
            timeline,
        }
    }

    /// Statistics for one conversation.
    pub fn conversation_stats(&self, conv: &Conversation) -> ConversationStats {
        let messages = conv.messages();
        let total = messages.len() as u32;
        let sent = messages.iter().filter(|m| m.from_me).count() as u32;
        let received = total - sent;

        let types = messages
            .iter()
            .fold(TypeTally::default(), |tally, m| tally.record(m));
        let samples = response_samples(messages);

        let chat_text = messages
            .iter()
            .filter(|m| m.kind == MessageKind::Chat)
            .map(|m| m.body.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let tokens = self.normalizer.normalize(&chat_text);

        let sentiment = messages
            .iter()
            .map(|m| self.scorer.score(&m.body))
            .fold(SentimentTally::default(), SentimentTally::record);

        let last = conv.last();
        let last_sender = if last.sender_name.trim().is_empty() {
            conv.chat_id().to_string()
        } else {
            last.sender_name.clone()
        };
        ConversationStats {
            chat_id: conv.chat_id().to_string(),
            contact: conv.contact_label(&self.agent_label),
            total,
            sent,
            received,
            pct_agent: percent(sent, total),
            start: conv.first().iso_timestamp.clone(),
            end: last.iso_timestamp.clone(),
            types,
            agent_response_mean: mean_response(&samples, Direction::Agent),
            contact_response_mean: mean_response(&samples, Direction::Contact),
            response_samples: samples,
            pending: conv.is_pending(),
            last_sender,
            last_body: last.body.clone(),
            last_seen: last.iso_timestamp.clone(),
            themes: self.themes.detect(&tokens),
            keywords: top_words(&tokens, KEYWORD_LIMIT),
            sentiment,
        }
    }

    fn timeline(&self, conversations: &[Conversation], stats: &[ConversationStats]) -> Vec<TimelineEntry> {
        let mut entries: Vec<(i64, TimelineEntry)> = conversations
            .iter()
            .zip(stats)
            .flat_map(|(conv, s)| {
                conv.messages().iter().map(move |m| {
                    let (sender, recipient) = if m.from_me {
                        (self.agent_label.clone(), s.contact.clone())
                    } else {
                        (m.sender_label().to_string(), self.agent_label.clone())
                    };
                    (
                        m.sort_key(),
                        TimelineEntry {
                            timestamp: m.timestamp,
                            iso_timestamp: m.iso_timestamp.clone(),
                            sender,
                            recipient,
                            kind: m.kind.clone(),
                            body: m.body.clone(),
                        },
                    )
                })
            })
            .collect();
        entries.sort_by_key(|(key, _)| *key);
        entries.into_iter().map(|(_, entry)| entry).collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(
            Normalizer::default(),
            ThemeClassifier::default(),
            SentimentScorer::default(),
        )
    }
}

fn percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        (part as f64 / total as f64 * 100.0).round() as u32
    }
}

/// Stable descending sort truncated to [`TOP_N`]; ties keep input order.
fn top_n<T: PartialOrd>(mut items: Vec<Ranked<T>>) -> Vec<Ranked<T>> {
    items.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    items.truncate(TOP_N);
    items
}

/// Occurrence counts in first-seen order.
fn count_in_order<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<Ranked<u32>> {
    let mut counts: Vec<Ranked<u32>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        match index.get(label) {
            Some(&i) => counts[i].value += 1,
            None => {
                index.insert(label, counts.len());
                counts.push(Ranked {
                    label: label.to_string(),
                    value: 1,
                });
            }
        }
    }
    counts
}

/// Preview of the longest body by character count; the first one wins ties.
fn longest_body<'a>(messages: impl Iterator<Item = &'a Message>) -> Option<String> {
    let mut longest: Option<(&str, usize)> = None;
    for m in messages {
        let len = m.body.chars().count();
        if longest.map_or(true, |(_, best)| len > best) {
            longest = Some((m.body.as_str(), len));
        }
    }
    longest
        .filter(|(_, len)| *len > 0)
        .map(|(body, _)| body.chars().take(PREVIEW_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use digest_core::types::RawMessage;
    use serde_json::json;

    fn msg(chat: &str, ts: i64, from_me: bool, body: &str) -> Message {
        Message::from(RawMessage {
            chat_id: Some(chat.into()),
            id: Some(format!("{}-{}", chat, ts)),
            timestamp: Some(ts),
            iso_timestamp: Some(format!("t{}", ts)),
            sender_name: Some(format!("{}-name", chat)),
            kind: Some("chat".into()),
            body: Some(body.into()),
            from_me: Some(from_me),
        })
    }

    fn typed(chat: &str, ts: i64, from_me: bool, kind: &str) -> Message {
        let mut m = msg(chat, ts, from_me, "");
        m.kind = MessageKind::from(kind.to_string());
        m
    }

    fn scenario() -> ChatLog {
        ChatLog::from_value(json!([
            {"chatId": "chat1", "id": "m1", "timestamp": 0, "isoTimestamp": "2024-01-01T00:00:00Z",
             "senderName": "Alice", "type": "chat", "body": "Olá, tudo bem?", "fromMe": false},
            {"chatId": "chat1", "id": "m2", "timestamp": 1800, "isoTimestamp": "2024-01-01T00:30:00Z",
             "senderName": "Bot", "type": "chat", "body": "Tudo ótimo!", "fromMe": true},
            {"chatId": "chat2", "id": "m3", "timestamp": 0, "isoTimestamp": "2024-01-01T00:00:00Z",
             "senderName": "Charlie", "type": "chat", "body": "Reunião amanhã às 10h?", "fromMe": false},
        ]))
        .unwrap()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let summary = Analyzer::default().summarize(&scenario());

        assert_eq!(summary.total_messages, 3);
        assert_eq!(summary.sent_by_agent, 1);
        assert_eq!(summary.received, 2);
        assert_eq!(summary.unique_chats, 2);

        let chat1 = &summary.conversations[0];
        let chat2 = &summary.conversations[1];
        assert_eq!(chat1.chat_id, "chat1");
        assert!(!chat1.pending);
        assert!(chat2.pending);

        assert_eq!(
            chat1.response_samples,
            vec![ResponseSample {
                responder: Direction::Agent,
                seconds: 1800
            }]
        );
        assert_eq!(chat1.agent_response_mean, Some(1800.0));
        assert_eq!(chat1.contact_response_mean, None);

        assert!(chat2.themes.contains(&"Agendamentos/Compromissos".to_string()));

        assert_eq!(summary.pending.len(), 1);
        assert_eq!(summary.pending[0].chat_id, "chat2");
        assert_eq!(summary.pending[0].contact, "Charlie (chat2)");
        assert_eq!(summary.overall_response_mean, Some(1800.0));
    }

    #[test]
    fn test_counts_partition_by_direction() {
        let log = ChatLog::from(vec![
            msg("a", 1, false, "oi"),
            msg("a", 2, true, "oi"),
            msg("a", 3, true, "tudo?"),
            msg("b", 1, true, "ola"),
            msg("c", 1, false, "?"),
        ]);
        let summary = Analyzer::default().summarize(&log);

        for conv in &summary.conversations {
            assert_eq!(conv.sent + conv.received, conv.total);
            assert!(conv.pct_agent <= 100);
        }
        assert_eq!(summary.sent_by_agent + summary.received, summary.total_messages);
        assert_eq!(summary.total_messages, 5);
        assert_eq!(summary.conversations[0].pct_agent, 67);
        assert_eq!(summary.conversations[1].pct_agent, 100);
        assert_eq!(summary.conversations[2].pct_agent, 0);
    }

    #[test]
    fn test_pending_detection_uses_sorted_order() {
        // Input order ends with the agent, but by timestamp the contact wrote last.
        let log = ChatLog::from(vec![
            msg("a", 10, false, "still there?"),
            msg("a", 5, true, "done"),
            msg("b", 1, false, "hi"),
            msg("b", 2, true, "hello"),
        ]);
        let summary = Analyzer::default().summarize(&log);
        assert!(summary.conversations[0].pending);
        assert!(!summary.conversations[1].pending);
        assert_eq!(summary.pending.len(), 1);
        assert_eq!(summary.pending[0].chat_id, "a");
        assert_eq!(summary.pending[0].last_body, "still there?");
        assert_eq!(summary.pending[0].total, 2);
    }

    #[test]
    fn test_response_samples_on_direction_switch_only() {
        let messages = vec![
            msg("a", 0, false, "q1"),
            msg("a", 10, false, "q2"),
            msg("a", 30, true, "a1"),
            msg("a", 40, true, "a2"),
            msg("a", 100, false, "q3"),
        ];
        let samples = response_samples(&messages);
        assert_eq!(
            samples,
            vec![
                ResponseSample {
                    responder: Direction::Agent,
                    seconds: 20
                },
                ResponseSample {
                    responder: Direction::Contact,
                    seconds: 60
                },
            ]
        );
    }

    #[test]
    fn test_outlier_samples_are_excluded() {
        let conv = Conversation::new(
            "a",
            vec![
                msg("a", 0, false, "q"),
                msg("a", 700_000, true, "late"),
                msg("a", 700_000, false, "same second"),
                msg("a", 700_000, true, "same second again"),
            ],
        )
        .unwrap();
        let stats = Analyzer::default().conversation_stats(&conv);
        assert_eq!(stats.response_samples.len(), 3);
        assert_eq!(stats.agent_response_mean, None);
        assert_eq!(stats.contact_response_mean, None);

        let summary = Analyzer::default().summarize(&ChatLog::from(conv.messages().to_vec()));
        assert!(summary.slowest_responses.is_empty());
        assert_eq!(summary.overall_response_mean, None);
    }

    #[test]
    fn test_negative_delta_is_excluded() {
        let mut late = msg("a", 50, true, "reply");
        late.timestamp = Some(40);
        let samples = response_samples(&[msg("a", 50, false, "q"), late]);
        assert_eq!(samples[0].seconds, -10);
        assert_eq!(mean_response(&samples, Direction::Agent), None);
    }

    #[test]
    fn test_unknown_timestamps_yield_no_samples() {
        let mut unknown = msg("a", 0, true, "reply");
        unknown.timestamp = None;
        assert!(response_samples(&[unknown, msg("a", 100, false, "q")]).is_empty());
    }

    #[test]
    fn test_global_response_mean_is_mean_of_means() {
        let log = ChatLog::from(vec![
            // a: agent samples 10 and 30 -> mean 20
            msg("a", 0, false, "q"),
            msg("a", 10, true, "r"),
            msg("a", 20, false, "q"),
            msg("a", 50, true, "r"),
            // b: agent sample 100 -> mean 100
            msg("b", 0, false, "q"),
            msg("b", 100, true, "r"),
        ]);
        let summary = Analyzer::default().summarize(&log);
        assert_eq!(summary.overall_response_mean, Some(60.0));
        assert_eq!(summary.slowest_responses[0].label, "b-name (b)");
        assert_eq!(summary.slowest_responses[0].value, 100.0);
        assert_eq!(summary.slowest_responses[1].value, 20.0);
    }

    #[test]
    fn test_rankings_are_bounded_and_ties_keep_first_seen() {
        let mut messages = Vec::new();
        for chat in ["c1", "c2", "c3", "c4", "c5"] {
            messages.push(msg(chat, 0, false, "preciso de ajuda"));
        }
        messages.push(msg("c4", 1, false, "mais uma"));
        let summary = Analyzer::default().summarize(&ChatLog::from(messages));

        let engaged: Vec<&str> = summary.top_engaged.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(engaged, vec!["c4-name (c4)", "c1-name (c1)", "c2-name (c2)"]);
        assert_eq!(summary.top_engaged[0].value, 2);

        assert_eq!(summary.pending.len(), 5);
        assert_eq!(summary.top_pending_contacts.len(), TOP_N);
        assert_eq!(summary.top_pending_contacts[0].label, "c1-name");

        assert!(summary.top_themes.len() <= TOP_N);
        assert_eq!(summary.top_themes[0].label, "Solicitações/Pendências");
        assert_eq!(summary.top_themes[0].value, 5);
    }

    #[test]
    fn test_themes_and_keywords_use_chat_bodies_only() {
        let mut doc = msg("a", 2, false, "orçamento em anexo");
        doc.kind = MessageKind::Document;
        let log = ChatLog::from(vec![msg("a", 1, false, "bom dia, bom dia"), doc]);
        let stats = &Analyzer::default().summarize(&log).conversations[0];

        assert_eq!(stats.themes, vec!["Relacionamento/Pessoal"]);
        assert_eq!(stats.keywords, vec!["bom (2)", "dia (2)"]);
    }

    #[test]
    fn test_type_tally() {
        let log = ChatLog::from(vec![
            typed("a", 1, false, "image"),
            typed("a", 2, false, "ptt"),
            typed("a", 3, true, "document"),
            typed("a", 4, true, "sticker"),
            msg("a", 5, true, "ok"),
        ]);
        let stats = &Analyzer::default().summarize(&log).conversations[0];
        assert_eq!(stats.types.received_count(&MessageKind::Image), 1);
        assert_eq!(stats.types.received_count(&MessageKind::Ptt), 1);
        assert_eq!(stats.types.sent_count(&MessageKind::Document), 1);
        assert_eq!(stats.types.sent_count(&MessageKind::Chat), 1);
        assert_eq!(stats.types.sent.get("sticker"), Some(&1));
        assert_eq!(stats.total, 5);
    }

    #[test]
    fn test_sentiment_rollup() {
        let summary = Analyzer::default().summarize(&scenario());
        // "Olá, tudo bem?" (+2), "Tudo ótimo!" (+3), meeting question (0)
        assert_eq!(summary.sentiment.positive, 2);
        assert_eq!(summary.sentiment.negative, 0);
        assert_eq!(summary.sentiment.neutral, 1);
        assert!((summary.sentiment.mean() - 5.0 / 3.0).abs() < 1e-9);
        assert_eq!(SentimentTally::default().mean(), 0.0);
    }

    #[test]
    fn test_longest_messages() {
        let long = "x".repeat(150);
        let log = ChatLog::from(vec![
            msg("a", 1, false, "short"),
            msg("a", 2, false, &long),
            msg("b", 1, false, &"y".repeat(150)),
            msg("a", 3, true, "reply"),
            msg("b", 2, true, "other"),
        ]);
        let summary = Analyzer::default().summarize(&log);
        let received = summary.longest_received.unwrap();
        assert_eq!(received.chars().count(), PREVIEW_CHARS);
        assert!(received.starts_with('x'));
        assert_eq!(summary.longest_sent.as_deref(), Some("reply"));
    }

    #[test]
    fn test_timeline_is_globally_sorted() {
        let log = ChatLog::from(vec![
            msg("a", 30, true, "third"),
            msg("b", 10, false, "first"),
            msg("a", 20, false, "second"),
        ]);
        let summary = Analyzer::default().summarize(&log);
        let bodies: Vec<&str> = summary.timeline.iter().map(|e| e.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
        assert_eq!(summary.timeline[2].sender, "BOT");
        assert_eq!(summary.timeline[2].recipient, "a-name (a)");
        assert_eq!(summary.timeline[0].recipient, "BOT");
    }

    #[test]
    fn test_empty_log() {
        let summary = Analyzer::default().summarize(&ChatLog::default());
        assert_eq!(summary.total_messages, 0);
        assert_eq!(summary.unique_chats, 0);
        assert!(summary.pending.is_empty());
        assert!(summary.top_engaged.is_empty());
        assert_eq!(summary.overall_response_mean, None);
        assert_eq!(summary.sentiment.mean(), 0.0);
        assert!(summary.longest_received.is_none());
        assert!(summary.timeline.is_empty());
    }

    #[test]
    fn test_from_config_applies_labels() {
        let mut config = AppConfig::default();
        config.report.agent_label = "Assistente".into();
        let analyzer = Analyzer::from_config(&config).unwrap();
        assert_eq!(analyzer.agent_label(), "Assistente");

        let summary = analyzer.summarize(&ChatLog::from(vec![msg("a", 1, true, "oi")]));
        assert_eq!(summary.conversations[0].contact, "Assistente (a)");
    }

    #[test]
    fn test_pending_ranking_groups_by_sender_across_chats() {
        let named = |chat: &str, sender: &str| {
            let mut m = msg(chat, 1, false, "oi");
            m.sender_name = sender.into();
            m
        };
        let log = ChatLog::from(vec![named("g1", "Alice"), named("g2", "Alice"), named("g3", "Bob")]);
        let summary = Analyzer::default().summarize(&log);

        assert_eq!(summary.pending.len(), 3);
        assert_eq!(
            summary.top_pending_contacts,
            vec![
                Ranked {
                    label: "Alice".to_string(),
                    value: 2
                },
                Ranked {
                    label: "Bob".to_string(),
                    value: 1
                },
            ]
        );
    }

    #[test]
    fn test_unnamed_pending_sender_falls_back_to_chat_id() {
        let mut m = msg("5511999998888@c.us", 1, false, "?");
        m.sender_name = String::new();
        let summary = Analyzer::default().summarize(&ChatLog::from(vec![m]));
        assert_eq!(summary.pending[0].sender, "5511999998888@c.us");
        assert_eq!(summary.top_pending_contacts[0].label, "5511999998888@c.us");
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let messages = vec![msg("a", i64::MIN, false, "q"), msg("a", i64::MAX, true, "r")];
        assert!(response_samples(&messages).is_empty());

        let summary = Analyzer::default().summarize(&ChatLog::from(messages));
        assert_eq!(summary.total_messages, 2);
        assert_eq!(summary.overall_response_mean, None);
    }

    #[test]
    fn test_timeline_ties_keep_conversation_order() {
        // Equal timestamps: conversations appear in first-seen order, then
        // input order within each conversation.
        let log = ChatLog::from(vec![
            msg("a", 10, false, "a1"),
            msg("b", 10, false, "b1"),
            msg("a", 10, true, "a2"),
        ]);
        let summary = Analyzer::default().summarize(&log);
        let bodies: Vec<&str> = summary.timeline.iter().map(|e| e.body.as_str()).collect();
        assert_eq!(bodies, vec!["a1", "a2", "b1"]);
    }
}
