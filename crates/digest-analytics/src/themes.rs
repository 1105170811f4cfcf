//! Theme detection over normalized text.
//!
//! A theme table is an ordered list of signatures, each a name plus regex
//! triggers. Declaration order is priority order when the result is truncated.

use crate::text::fold;
use digest_core::config::{AnalysisConfig, ThemeConfig};
use digest_core::error::Result;
use regex::Regex;

/// Maximum number of themes reported for one text.
pub const MAX_THEMES: usize = 3;

/// A compiled theme: its name and trigger patterns.
#[derive(Debug, Clone)]
pub struct ThemeSignature {
    pub name: String,
    triggers: Vec<Regex>,
}

impl ThemeSignature {
    /// Compile a signature. Triggers are folded like the text they are
    /// matched against, so accented triggers still match.
    pub fn new(name: impl Into<String>, triggers: &[String]) -> Result<Self> {
        let triggers = triggers
            .iter()
            .map(|t| Regex::new(&fold(t)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            triggers,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.triggers.iter().any(|t| t.is_match(text))
    }
}

/// Classifies token streams against a theme table.
#[derive(Debug, Clone)]
pub struct ThemeClassifier {
    signatures: Vec<ThemeSignature>,
}

impl ThemeClassifier {
    /// Compile a theme table. Fails on the first invalid trigger.
    pub fn new(themes: &[ThemeConfig]) -> Result<Self> {
        let signatures = themes
            .iter()
            .map(|theme| ThemeSignature::new(theme.name.clone(), &theme.triggers))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { signatures })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Self::new(&config.themes)
    }

    /// Theme names matched by `tokens`, in table order, at most [`MAX_THEMES`].
    pub fn detect(&self, tokens: &[String]) -> Vec<String> {
        let joined = tokens.join(" ");
        self.signatures
            .iter()
            .filter(|sig| sig.matches(&joined))
            .take(MAX_THEMES)
            .map(|sig| sig.name.clone())
            .collect()
    }

    pub fn theme_names(&self) -> impl Iterator<Item = &str> {
        self.signatures.iter().map(|sig| sig.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl Default for ThemeClassifier {
    /// The built-in table. Patterns that fail to compile are skipped.
    fn default() -> Self {
        let signatures = AnalysisConfig::default()
            .themes
            .iter()
            .filter_map(|theme| match ThemeSignature::new(theme.name.clone(), &theme.triggers) {
                Ok(sig) => Some(sig),
                Err(e) => {
                    tracing::warn!("Skipping theme {}: {}", theme.name, e);
                    None
                }
            })
            .collect();
        Self { signatures }
    }
}
