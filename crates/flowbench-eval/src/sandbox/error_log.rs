//! Append-only text log of failed code checks

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Writes `"{YYYY-MM-DD HH:MM:SS} - {message}"` lines to a file.
///
/// Failures to write are logged and otherwise ignored; a broken error log
/// must not turn a check result into an error.
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry
    pub async fn append(&self, message: &str) {
        let line = format!("{} - {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message);

        let _guard = self.lock.lock().await;
        let result = async {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(path = ?self.path, error = %e, "Failed to write error log");
        }
    }
}
