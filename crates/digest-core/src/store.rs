//! Daily JSON message log.
//!
//! One file per calendar day (`chats-YYYY-MM-DD.json`), each a JSON array of
//! message records. A day file that grows past the rotation threshold rolls
//! over to numbered siblings (`chats-YYYY-MM-DD-1.json`, `-2`, ...).

use crate::config::StoreConfig;
use crate::error::{DigestError, Result};
use crate::types::{Message, RawMessage};
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;

/// Reads and appends the daily message log.
#[derive(Debug, Clone)]
pub struct LogStore {
    dir: PathBuf,
    rotate_bytes: u64,
}

impl LogStore {
    pub fn new(dir: impl Into<PathBuf>, rotate_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            rotate_bytes,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.resolved_log_dir(), config.rotate_bytes())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name of the primary log for a day.
    pub fn file_name(date: NaiveDate) -> String {
        format!("chats-{}.json", date.format("%Y-%m-%d"))
    }

    fn rotated_name(date: NaiveDate, index: u32) -> String {
        format!("chats-{}-{}.json", date.format("%Y-%m-%d"), index)
    }

    /// Create the log directory if needed.
    pub async fn ensure_dir(&self) -> Result<()> {
        if !async_fs::try_exists(&self.dir).await? {
            async_fs::create_dir_all(&self.dir).await?;
            tracing::info!("Created message log directory {}", self.dir.display());
        }
        Ok(())
    }

    /// Existing files for a day: the primary file first, then rotated siblings.
    pub async fn day_files(&self, date: NaiveDate) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let primary = self.dir.join(Self::file_name(date));
        if async_fs::try_exists(&primary).await? {
            files.push(primary);
        }
        let mut index = 1;
        loop {
            let sibling = self.dir.join(Self::rotated_name(date, index));
            if !async_fs::try_exists(&sibling).await? {
                break;
            }
            files.push(sibling);
            index += 1;
        }
        Ok(files)
    }

    /// Load every message recorded for one day.
    ///
    /// Empty, unreadable, or non-array files are skipped with a log entry, as
    /// are records without a `chatId`.
    pub async fn load_day(&self, date: NaiveDate) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        for path in self.day_files(date).await? {
            messages.extend(read_log_file(&path).await);
        }
        Ok(messages)
    }

    /// Load `days` consecutive days ending at `end` (inclusive), oldest first.
    pub async fn load_range(&self, end: NaiveDate, days: u32) -> Result<Vec<Message>> {
        self.ensure_dir().await?;
        let mut messages = Vec::new();
        let mut loaded_days = 0;
        for offset in (0..days as i64).rev() {
            let date = end - Duration::days(offset);
            let day = self.load_day(date).await?;
            if !day.is_empty() {
                loaded_days += 1;
            }
            messages.extend(day);
        }
        tracing::info!(
            "Loaded {} messages from {} day(s) of logs in {}",
            messages.len(),
            loaded_days,
            self.dir.display()
        );
        Ok(messages)
    }

    /// Append one message to the log for the day of its timestamp.
    ///
    /// Missing fields are filled in before writing: the timestamp defaults to
    /// now, `isoTimestamp` is derived from the timestamp, `type` to `chat`.
    /// Returns the file that received the record.
    pub async fn append(&self, raw: RawMessage) -> Result<PathBuf> {
        let chat_id = raw
            .chat_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DigestError::Store("message has no chatId".into()))?;
        let timestamp = raw.timestamp.unwrap_or_else(|| Utc::now().timestamp());
        let captured = DateTime::<Utc>::from_timestamp(timestamp, 0)
            .ok_or_else(|| DigestError::Store(format!("timestamp out of range: {}", timestamp)))?;

        let record = RawMessage {
            chat_id: Some(chat_id.clone()),
            id: Some(raw.id.unwrap_or_default()),
            timestamp: Some(timestamp),
            iso_timestamp: Some(
                raw.iso_timestamp
                    .unwrap_or_else(|| captured.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ),
            sender_name: Some(raw.sender_name.unwrap_or_default()),
            kind: Some(raw.kind.unwrap_or_else(|| "chat".into())),
            body: Some(raw.body.unwrap_or_default()),
            from_me: Some(raw.from_me.unwrap_or(false)),
        };

        self.ensure_dir().await?;
        let path = self.target_file(captured.date_naive()).await?;

        let mut records = match async_fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Array(items)) => items,
                Ok(_) => {
                    let aside = set_aside(&path).await?;
                    tracing::warn!(
                        "Existing content of {} is not an array; moved to {} and starting a new one",
                        path.display(),
                        aside.display()
                    );
                    Vec::new()
                }
                Err(e) => {
                    let aside = set_aside(&path).await?;
                    tracing::error!(
                        "Failed to parse {}: {}; moved to {} and starting a new array",
                        path.display(),
                        e,
                        aside.display()
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        records.push(serde_json::to_value(&record)?);
        let json = serde_json::to_string_pretty(&records)?;
        async_fs::write(&path, json).await?;

        tracing::info!(
            "Stored message {:?} for chat {} in {} ({} messages in file)",
            record.id.as_deref().unwrap_or_default(),
            chat_id,
            path.display(),
            records.len()
        );
        Ok(path)
    }

    /// Pick the file that should receive the next record for a day.
    async fn target_file(&self, date: NaiveDate) -> Result<PathBuf> {
        let primary = self.dir.join(Self::file_name(date));
        if !self.is_full(&primary).await? {
            return Ok(primary);
        }
        let mut index = 1;
        loop {
            let sibling = self.dir.join(Self::rotated_name(date, index));
            if !self.is_full(&sibling).await? {
                return Ok(sibling);
            }
            index += 1;
        }
    }

    async fn is_full(&self, path: &Path) -> Result<bool> {
        match async_fs::metadata(path).await {
            Ok(meta) => Ok(meta.len() > self.rotate_bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Rename an unreadable day file to `<name>.corrupt[-N]` so a fresh one can
/// take its place. The new name never matches a day file.
async fn set_aside(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut target = path.with_file_name(format!("{}.corrupt", name));
    let mut index = 1;
    while async_fs::try_exists(&target).await? {
        target = path.with_file_name(format!("{}.corrupt-{}", name, index));
        index += 1;
    }
    async_fs::rename(path, &target).await?;
    Ok(target)
}

/// Read one log file, logging and skipping anything unusable.
async fn read_log_file(path: &Path) -> Vec<Message> {
    let contents = match async_fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("Failed to read message log {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    if contents.trim().is_empty() {
        tracing::warn!("Message log {} is empty", path.display());
        return Vec::new();
    }
    let items = match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            tracing::warn!("Message log {} is not a JSON array", path.display());
            return Vec::new();
        }
        Err(e) => {
            tracing::error!("Failed to parse message log {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| {
            let raw: RawMessage = match serde_json::from_value(item.clone()) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Skipping malformed record in {}: {}", path.display(), e);
                    return None;
                }
            };
            if raw.chat_id.as_deref().map_or(true, str::is_empty) {
                tracing::warn!("Record without chatId in {}: {}", path.display(), item);
                return None;
            }
            Some(Message::from(raw))
        })
        .collect()
}
