//! Lexicon-based sentiment scoring.
//!
//! Each token found in the lexicon adds its integer weight (AFINN-style,
//! -5..=5). A token directly after a negator counts with the opposite sign.

use crate::text::{fold, tokenize};
use digest_core::config::SentimentConfig;
use serde::Serialize;
use std::collections::HashMap;

/// Built-in lexicon. Keys are folded (lowercase, no diacritics).
const DEFAULT_LEXICON: &[(&str, i32)] = &[
    // Portuguese, positive
    ("otimo", 3),
    ("otima", 3),
    ("bom", 3),
    ("boa", 3),
    ("bem", 2),
    ("excelente", 3),
    ("maravilhoso", 4),
    ("maravilhosa", 4),
    ("perfeito", 3),
    ("perfeita", 3),
    ("incrivel", 4),
    ("fantastico", 4),
    ("obrigado", 2),
    ("obrigada", 2),
    ("valeu", 2),
    ("feliz", 3),
    ("alegria", 3),
    ("amor", 3),
    ("amo", 3),
    ("adoro", 3),
    ("adorei", 3),
    ("gostei", 2),
    ("legal", 2),
    ("show", 2),
    ("parabens", 3),
    ("sucesso", 2),
    ("lindo", 3),
    ("linda", 3),
    ("beleza", 2),
    ("abraco", 2),
    ("tranquilo", 1),
    ("resolvido", 2),
    ("funciona", 1),
    ("funcionou", 1),
    ("ajudou", 2),
    // Portuguese, negative
    ("ruim", -3),
    ("pessimo", -3),
    ("pessima", -3),
    ("horrivel", -3),
    ("terrivel", -3),
    ("pior", -3),
    ("problema", -2),
    ("problemas", -2),
    ("erro", -2),
    ("erros", -2),
    ("falha", -2),
    ("falhou", -2),
    ("quebrado", -2),
    ("triste", -2),
    ("chateado", -2),
    ("chateada", -2),
    ("irritado", -3),
    ("raiva", -3),
    ("odeio", -3),
    ("atraso", -2),
    ("atrasado", -2),
    ("demora", -2),
    ("demorou", -2),
    ("reclamacao", -2),
    ("infelizmente", -2),
    ("dificil", -1),
    ("cancelado", -1),
    // English
    ("good", 3),
    ("great", 3),
    ("excellent", 3),
    ("awesome", 4),
    ("amazing", 4),
    ("wonderful", 4),
    ("nice", 3),
    ("perfect", 3),
    ("love", 3),
    ("happy", 3),
    ("thanks", 2),
    ("thank", 2),
    ("cool", 1),
    ("bad", -3),
    ("terrible", -3),
    ("awful", -3),
    ("worst", -3),
    ("hate", -3),
    ("angry", -3),
    ("sad", -2),
    ("wrong", -2),
    ("problem", -2),
    ("error", -2),
    ("fail", -2),
    ("failed", -2),
    ("broken", -1),
    ("sorry", -1),
];

/// Tokens that flip the sign of the following word.
const NEGATORS: &[&str] = &[
    "nao", "nunca", "jamais", "nem", "not", "never", "dont", "cant", "wont", "isnt", "doesnt",
    "didnt",
];

/// Sign bucket of a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s > 0 => Polarity::Positive,
            s if s < 0 => Polarity::Negative,
            _ => Polarity::Neutral,
        }
    }
}

/// Scores message bodies against a polarity lexicon.
#[derive(Debug, Clone)]
pub struct SentimentScorer {
    lexicon: HashMap<String, i32>,
}

impl SentimentScorer {
    pub fn new() -> Self {
        Self {
            lexicon: DEFAULT_LEXICON
                .iter()
                .map(|(word, weight)| (word.to_string(), *weight))
                .collect(),
        }
    }

    /// Built-in lexicon extended (or overridden) by configured words.
    pub fn from_config(config: &SentimentConfig) -> Self {
        let mut scorer = Self::new();
        for (word, weight) in &config.extra_words {
            scorer.set_weight(word, *weight);
        }
        scorer
    }

    pub fn set_weight(&mut self, word: &str, weight: i32) {
        self.lexicon.insert(fold(word), weight);
    }

    /// Polarity score of a text; 0 for empty or neutral text.
    pub fn score(&self, text: &str) -> i32 {
        let tokens = tokenize(text);
        let mut total = 0;
        for (i, token) in tokens.iter().enumerate() {
            if let Some(&weight) = self.lexicon.get(token) {
                let negated = i > 0 && NEGATORS.contains(&tokens[i - 1].as_str());
                total += if negated { -weight } else { weight };
            }
        }
        total
    }

    pub fn classify(&self, text: &str) -> Polarity {
        Polarity::from_score(self.score(text))
    }
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}
