//! Text normalization and keyword ranking.

use digest_core::config::{AnalysisConfig, DEFAULT_STOPWORDS};
use std::collections::{HashMap, HashSet};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Default number of keywords reported per conversation.
pub const KEYWORD_LIMIT: usize = 10;

/// Characters removed before tokenizing.
const PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\'', '-',
];

/// Lowercase and strip diacritics (`"Ação"` -> `"acao"`).
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Fold, drop punctuation, and split on whitespace. Stopwords are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let stripped: String = fold(text)
        .chars()
        .filter(|c| !PUNCTUATION.contains(c))
        .collect();
    stripped.split_whitespace().map(str::to_string).collect()
}

/// Tokenizer with a stopword filter.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stopwords: HashSet<String>,
}

impl Normalizer {
    /// Stopwords are folded, so `"é"` and `"e"` are the same entry.
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: stopwords.into_iter().map(|w| fold(w.as_ref())).collect(),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(&config.stopwords)
    }

    /// Token stream for ranking and theme detection. Empty input yields an
    /// empty vector.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .into_iter()
            .filter(|token| !self.stopwords.contains(token))
            .collect()
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&fold(word))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS)
    }
}

/// Normalize with the default stopword list.
pub fn normalize(text: &str) -> Vec<String> {
    Normalizer::default().normalize(text)
}

/// Most frequent tokens as `"word (count)"`, highest count first. Ties keep
/// the order in which the words first appeared.
pub fn top_words(tokens: &[String], limit: usize) -> Vec<String> {
    let mut counts: Vec<(&str, u32)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for token in tokens {
        match index.get(token.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token.as_str(), counts.len());
                counts.push((token.as_str(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(word, count)| format!("{} ({})", word, count))
        .collect()
}
