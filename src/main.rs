use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use digest_analytics::{Analyzer, ReportGenerator};
use digest_core::config::AppConfig;
use digest_core::input::ChatLog;
use digest_core::store::LogStore;
use digest_core::types::RawMessage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chat-digest",
    about = "Daily digests and pending-reply reports from captured chat logs",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/chat-digest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the label used for the agent's own messages
    #[arg(long, global = true)]
    agent_label: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a report from the log store or a JSON file
    Report {
        /// Last day of the report window (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Number of days in the window (default from config)
        #[arg(long)]
        days: Option<u32>,
        /// Read messages from a JSON file instead of the log store
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only list conversations waiting on a reply
        #[arg(long)]
        pending: bool,
    },

    /// Append the messages of a flat JSON array to the log store
    Import {
        /// JSON file to import
        file: PathBuf,
    },

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so a report on stdout stays clean.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "chat_digest=info,warn".into()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    if let Some(label) = &cli.agent_label {
        config.report.agent_label = label.clone();
    }
    config.validate()?;

    match cli.command {
        Commands::Report {
            date,
            days,
            input,
            output,
            pending,
        } => {
            let log = match input {
                Some(path) => read_chat_log(&path).await?,
                None => {
                    let store = LogStore::from_config(&config.store);
                    let end = date.unwrap_or_else(|| Local::now().date_naive());
                    let days = days.unwrap_or(config.store.default_days).max(1);
                    ChatLog::from(store.load_range(end, days).await?)
                }
            };

            let analyzer = Analyzer::from_config(&config)?;
            let summary = analyzer.summarize(&log);
            tracing::info!(
                "Report covers {} messages in {} conversations, {} pending",
                summary.total_messages,
                summary.unique_chats,
                summary.pending.len()
            );

            let report = if pending {
                ReportGenerator::pending_report(&summary)
            } else {
                ReportGenerator::render(&summary)
            };
            match output {
                Some(path) => {
                    tokio::fs::write(&path, report)
                        .await
                        .with_context(|| format!("Failed to write report to {}", path.display()))?;
                    println!("Report written to: {}", path.display());
                }
                None => print!("{}", report),
            }
        }
        Commands::Import { file } => {
            import_file(&config, &file).await?;
        }
        Commands::Config { action } => {
            handle_config_command(action, &config, cli.config.as_deref())?;
        }
    }

    Ok(())
}

async fn read_chat_log(path: &Path) -> Result<ChatLog> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let log = ChatLog::from_json(&text)
        .with_context(|| format!("Failed to parse messages from {}", path.display()))?;
    tracing::info!("Read {} messages from {}", log.message_count(), path.display());
    Ok(log)
}

async fn import_file(config: &AppConfig, path: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<serde_json::Value> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of messages", path.display()))?;

    let store = LogStore::from_config(&config.store);
    let mut imported = 0usize;
    for (idx, record) in records.into_iter().enumerate() {
        let raw: RawMessage = match serde_json::from_value(record) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping malformed record #{}: {}", idx, e);
                continue;
            }
        };
        match store.append(raw).await {
            Ok(_) => imported += 1,
            Err(e) => tracing::warn!("Skipping record #{}: {}", idx, e),
        }
    }

    println!("Imported {} messages into {}", imported, store.dir().display());
    Ok(())
}

fn handle_config_command(
    action: Option<ConfigAction>,
    config: &AppConfig,
    custom_path: Option<&Path>,
) -> Result<()> {
    let path = custom_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                AppConfig::default().save_to(&path)?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", path.display());
        }
    }
    Ok(())
}
