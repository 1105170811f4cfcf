//! Analytics and report generation for captured chat logs.
//!
//! Normalizes message text, classifies themes and sentiment, aggregates
//! per-conversation statistics, and renders the consolidated text report.

pub mod aggregations;
pub mod reports;
pub mod sentiment;
pub mod text;
pub mod themes;

pub use aggregations::{Analyzer, ChatSummary, ConversationStats};
pub use reports::ReportGenerator;
pub use sentiment::{Polarity, SentimentScorer};
pub use text::Normalizer;
pub use themes::ThemeClassifier;
