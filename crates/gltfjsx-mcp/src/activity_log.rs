//! Append-only activity log
//!
//! One line per tool call, `[<RFC 3339 timestamp>] <message>`, in `app.log`
//! under the working directory. The file is created on first write and never
//! read back.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;

pub const LOG_FILE_NAME: &str = "app.log";

#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    /// Log file inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(LOG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line
    pub async fn append(&self, message: &str) -> std::io::Result<()> {
        let line = format!(
            "[{}] {message}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    /// Append one line, reporting failures instead of returning them
    pub async fn record(&self, message: &str) {
        if let Err(e) = self.append(message).await {
            tracing::warn!(path = %self.path.display(), "Failed to write activity log: {}", e);
        }
    }
}
