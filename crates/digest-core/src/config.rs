use crate::error::{DigestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Function words dropped by the text normalizer.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "o", "as", "os", "de", "do", "da", "dos", "das", "que", "e", "é", "em", "um", "uma",
    "para", "por", "com", "se", "no", "na", "nos", "nas",
];

/// Default theme table, in priority order.
pub const DEFAULT_THEMES: &[(&str, &[&str])] = &[
    (
        "Relacionamento/Pessoal",
        &["amor", "amo", "bom dia", "❤️", "😃"],
    ),
    (
        "Agendamentos/Compromissos",
        &[
            "agenda", "visita", "horário", "marcar", "amanhã", "terça", "quinta", "reunião",
            "encontro",
        ],
    ),
    (
        "Informações/Notícias",
        &["link", "https://", "noticia", "newsletter", "ciencia"],
    ),
    (
        "Comercial/Financeiro",
        &[
            "preço", "custo", "valor", "pagar", "trabalho", "alunos", "cobrança", "video",
            "orçamento", "boleto", "pix",
        ],
    ),
    (
        "Solicitações/Pendências",
        &["quando finalizar", "avisa", "pendente", "preciso", "tem"],
    ),
    (
        "Mídia/Documentos Compartilhados",
        &["pptx", "xlsx", "pdf", r"\[image\]", r"\[ptt\]"],
    ),
    (
        "Suporte/Problemas",
        &["problema", "ajuda", "não funciona", "suporte", "erro"],
    ),
];

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub report: ReportConfig,
    pub store: StoreConfig,
    pub analysis: AnalysisConfig,
    pub sentiment: SentimentConfig,
}

impl AppConfig {
    /// Load configuration from default path (~/.config/chat-digest/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write current configuration to the default path.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Write current configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chat-digest")
            .join("config.toml")
    }

    /// Reject settings the analytics and store cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.report.agent_label.trim().is_empty() {
            return Err(DigestError::Config("report.agent_label must not be empty".into()));
        }
        if self.store.rotate_size_mb == 0 {
            return Err(DigestError::Config("store.rotate_size_mb must be at least 1".into()));
        }
        for theme in &self.analysis.themes {
            if theme.name.trim().is_empty() {
                return Err(DigestError::Config("analysis.themes entry without a name".into()));
            }
            if theme.triggers.iter().all(|t| t.trim().is_empty()) {
                return Err(DigestError::Config(format!(
                    "theme {} has no triggers",
                    theme.name
                )));
            }
        }
        Ok(())
    }

    /// Data directory for the message log.
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chat-digest")
    }
}

/// Report presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// How the automated agent is named in tables and the timeline.
    pub agent_label: String,
    /// Heading printed at the top of the report.
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            agent_label: "BOT".into(),
            title: "Conversation Digest".into(),
        }
    }
}

/// Daily message log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `chats-YYYY-MM-DD.json` files.
    pub log_dir: Option<PathBuf>,
    /// Number of days loaded when a report does not name a range.
    pub default_days: u32,
    /// Day files above this size (in MiB) roll over to numbered siblings.
    pub rotate_size_mb: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_dir: None, // resolved at runtime to data_dir/chats
            default_days: 7,
            rotate_size_mb: 5,
        }
    }
}

impl StoreConfig {
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| AppConfig::data_dir().join("chats"))
    }

    pub fn rotate_bytes(&self) -> u64 {
        self.rotate_size_mb.saturating_mul(1024 * 1024)
    }
}

/// A named topic and the patterns that trigger it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub name: String,
    /// Regex fragments matched against normalized text.
    pub triggers: Vec<String>,
}

/// Text analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub stopwords: Vec<String>,
    /// Theme signatures in priority order.
    pub themes: Vec<ThemeConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            themes: DEFAULT_THEMES
                .iter()
                .map(|(name, triggers)| ThemeConfig {
                    name: name.to_string(),
                    triggers: triggers.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        }
    }
}

/// Sentiment lexicon settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Extra or overriding lexicon entries, word -> weight.
    pub extra_words: BTreeMap<String, i32>,
}
