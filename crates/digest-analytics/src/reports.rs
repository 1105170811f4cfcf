//! Text report generation from a computed [`ChatSummary`].
//!
//! Rendering is pure formatting: every section is always present, degenerate
//! values render as placeholders, and the same summary always renders to the
//! same string.

use crate::aggregations::{ChatSummary, PendingItem, Ranked, TypeTally};
use digest_core::types::MessageKind;

const NONE: &str = "None";
const NOT_AVAILABLE: &str = "N/A";
const NO_PENDING: &str = "No pending conversations found.";
const NO_MESSAGES: &str = "No messages found.";

/// Report generator for the consolidated conversation digest.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Render the full report.
    pub fn render(summary: &ChatSummary) -> String {
        let mut report = String::new();

        report.push_str(&format!("# {}\n\n", summary.title));

        // Totals.
        report.push_str("## 1. Message Totals\n\n");
        report.push_str(&format!("- Total messages: {}\n", summary.total_messages));
        report.push_str(&format!(
            "- Sent by {}: {}\n",
            summary.agent_label, summary.sent_by_agent
        ));
        report.push_str(&format!("- Received from contacts: {}\n\n", summary.received));

        // Conversations.
        report.push_str("## 2. Distinct Conversations\n\n");
        report.push_str(&format!(
            "- {} distinct conversations with: {}\n\n",
            summary.unique_chats,
            join_or(&summary.contacts, NONE)
        ));

        // Sentiment.
        report.push_str("## 3. Sentiment\n\n");
        report.push_str(&format!("- Positive messages: {}\n", summary.sentiment.positive));
        report.push_str(&format!("- Negative messages: {}\n", summary.sentiment.negative));
        report.push_str(&format!("- Neutral messages: {}\n", summary.sentiment.neutral));
        report.push_str(&format!(
            "- Average score: {:.2}\n\n",
            summary.sentiment.mean()
        ));

        Self::conversation_table(&mut report, summary);
        Self::engagement(&mut report, summary);

        report.push_str("## 6. Pending Conversations\n\n");
        Self::pending_list(&mut report, &summary.pending, false);
        report.push('\n');

        report.push_str("## 7. Content Analysis\n\n");
        if summary.conversations.is_empty() {
            report.push_str(NO_MESSAGES);
            report.push('\n');
        }
        for conv in &summary.conversations {
            report.push_str(&format!(
                "Conversation with {}: Main topics ➔ [{}]; Keywords ➔ [{}].\n",
                conv.contact,
                join_or(&conv.themes, NONE),
                conv.keywords.join(", ")
            ));
        }
        report.push('\n');

        report.push_str("## 8. Timeline\n\n");
        if summary.timeline.is_empty() {
            report.push_str(NO_MESSAGES);
            report.push('\n');
        }
        for entry in &summary.timeline {
            let tag = match entry.kind {
                MessageKind::Chat => String::new(),
                ref other => format!(" [{}]", other),
            };
            report.push_str(&format!(
                "{} | {}{} → {}: \"{}\"\n",
                entry.iso_timestamp, entry.sender, tag, entry.recipient, entry.body
            ));
        }

        report
    }

    /// Short digest of the conversations still waiting on the agent,
    /// including a preview of each contact's last message.
    pub fn pending_report(summary: &ChatSummary) -> String {
        let mut report = String::new();
        report.push_str(&format!("# {}: Pending Conversations\n\n", summary.title));
        report.push_str(&format!(
            "{} of {} conversations are waiting on {}.\n\n",
            summary.pending.len(),
            summary.unique_chats,
            summary.agent_label
        ));
        Self::pending_list(&mut report, &summary.pending, true);
        report
    }

    fn conversation_table(report: &mut String, summary: &ChatSummary) {
        let agent = &summary.agent_label;
        report.push_str("## 4. Conversation Details\n\n");
        report.push_str(&format!(
            "| Contact | Sent by {agent} | Received | % {agent} | Start | End | Types Sent | Types Received |\n"
        ));
        report.push_str("|---|---|---|---|---|---|---|---|\n");
        for conv in &summary.conversations {
            report.push_str(&format!(
                "| {} | {} | {} | {} % | {} | {} | {} | {} |\n",
                conv.contact,
                conv.sent,
                conv.received,
                conv.pct_agent,
                conv.start,
                conv.end,
                type_breakdown(&conv.types, TypeTally::sent_count),
                type_breakdown(&conv.types, TypeTally::received_count),
            ));
        }
        report.push('\n');
    }

    fn engagement(report: &mut String, summary: &ChatSummary) {
        report.push_str("## 5. Engagement and Response Times\n\n");
        report.push_str(&format!(
            "- Most engaged contacts: {}\n",
            ranked(&summary.top_engaged, |n| format!("{} messages", n))
        ));
        report.push_str(&format!(
            "- Slowest average responses: {}\n",
            ranked(&summary.slowest_responses, |secs| seconds(*secs))
        ));
        report.push_str(&format!(
            "- Overall average response time: {}\n",
            summary
                .overall_response_mean
                .map(seconds)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        ));
        report.push_str(&format!(
            "- Contacts with most pending conversations: {}\n",
            ranked(&summary.top_pending_contacts, |n| n.to_string())
        ));
        report.push_str(&format!(
            "- Top themes: {}\n",
            ranked(&summary.top_themes, |n| n.to_string())
        ));
        report.push_str(&format!(
            "- Longest received message: {}\n",
            quoted(summary.longest_received.as_deref())
        ));
        report.push_str(&format!(
            "- Longest sent message: {}\n\n",
            quoted(summary.longest_sent.as_deref())
        ));
    }

    fn pending_list(report: &mut String, pending: &[PendingItem], with_body: bool) {
        if pending.is_empty() {
            report.push_str(NO_PENDING);
            report.push('\n');
            return;
        }
        for item in pending {
            report.push_str(&format!(
                "- {} | Last message: {} | Total: {}",
                item.contact, item.last_seen, item.total
            ));
            if with_body {
                report.push_str(&format!(" | \"{}\"", item.last_body));
            }
            report.push('\n');
        }
    }
}

/// Per-type counts in fixed order, e.g. `chat: 2, ptt: 0, image: 1, document: 0`.
fn type_breakdown(types: &TypeTally, count: fn(&TypeTally, &MessageKind) -> u32) -> String {
    MessageKind::TRACKED
        .iter()
        .map(|kind| format!("{}: {}", kind, count(types, kind)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn ranked<T>(items: &[Ranked<T>], value: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        return NONE.to_string();
    }
    items
        .iter()
        .map(|r| format!("{} ({})", r.label, value(&r.value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn seconds(secs: f64) -> String {
    format!("{} s", secs.round() as i64)
}

fn quoted(text: Option<&str>) -> String {
    match text {
        Some(t) => format!("\"{}\"", t),
        None => NONE.to_string(),
    }
}

fn join_or(items: &[String], placeholder: &str) -> String {
    if items.is_empty() {
        placeholder.to_string()
    } else {
        items.join(", ")
    }
}
