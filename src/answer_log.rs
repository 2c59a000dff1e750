//! Append-only question/answer log.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Timestamp format used in log entries.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One answered question.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub question: String,
    pub answer: String,
}

impl LogEntry {
    /// Create an entry stamped with the current local time.
    pub fn now(question: &str, answer: &str) -> Self {
        Self {
            timestamp: Local::now(),
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    /// Render the entry as a human-readable block.
    pub fn to_block(&self) -> String {
        format!(
            "--- Research Entry ---\nTimestamp: {}\nQuestion: {}\nAnswer: {}\n\n",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.question,
            self.answer
        )
    }
}

/// Durable sink for answered questions.
#[async_trait]
pub trait AnswerLog: Send + Sync {
    async fn append(&self, question: &str, answer: &str) -> Result<()>;
}

/// Answer log backed by a UTF-8 text file.
///
/// No locking: concurrent appends are separate short writes and may interleave.
pub struct FileAnswerLog {
    path: PathBuf,
}

impl FileAnswerLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AnswerLog for FileAnswerLog {
    async fn append(&self, question: &str, answer: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let entry = LogEntry::now(question, answer);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.to_block().as_bytes()).await?;
        file.flush().await?;

        debug!("Appended entry to {}", self.path.display());
        Ok(())
    }
}
