//! Mismatch log (`log.json`)
//!
//! A JSON array of items that scored below their family's threshold. Every
//! append re-reads the file, pushes one entry and rewrites it; a mutex keeps
//! concurrent appends from interleaving.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::{BenchError, BenchResult};
use crate::scoring::Answer;

/// One logged item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchEntry {
    pub question: String,
    pub right_answer: Answer,
    pub model_output: String,
    pub extracted_output: Answer,
}

/// Append-only JSON array on disk
#[derive(Debug)]
pub struct MismatchLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MismatchLog {
    /// Open the log, creating it as `[]` if missing
    pub async fn open(path: impl Into<PathBuf>) -> BenchResult<Self> {
        let path = path.into();
        if fs::metadata(&path).await.is_err() {
            fs::write(&path, "[]")
                .await
                .map_err(|e| BenchError::output(&path, e))?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry
    pub async fn append(&self, entry: &MismatchEntry) -> BenchResult<()> {
        let _guard = self.lock.lock().await;

        let mut entries = self.read_values().await?;
        entries.push(serde_json::to_value(entry)?);

        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| BenchError::output(&self.path, e))
    }

    /// All entries currently in the log
    pub async fn entries(&self) -> BenchResult<Vec<MismatchEntry>> {
        let _guard = self.lock.lock().await;
        let entries = self.read_values().await?;
        entries
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(BenchError::from))
            .collect()
    }

    async fn read_values(&self) -> BenchResult<Vec<Value>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BenchError::output(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entry(question: &str) -> MismatchEntry {
        MismatchEntry {
            question: question.to_string(),
            right_answer: Answer::Number(7.0),
            model_output: "6".to_string(),
            extracted_output: Answer::Number(6.0),
        }
    }

    #[tokio::test]
    async fn test_open_initializes_empty_array() {
        let dir = TempDir::new().unwrap();
        let log = MismatchLog::open(dir.path().join("log.json")).await.unwrap();
        assert_eq!(std::fs::read_to_string(log.path()).unwrap(), "[]");
        assert!(log.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_keeps_existing_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, r#"[{"note": "from an earlier run"}]"#).unwrap();

        let log = MismatchLog::open(&path).await.unwrap();
        log.append(&entry("q1")).await.unwrap();

        let values: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["note"], "from an earlier run");
        assert_eq!(values[1]["extracted_output"], serde_json::json!(6.0));
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(MismatchLog::open(dir.path().join("log.json")).await.unwrap());

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.append(&entry(&format!("q{}", i))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(log.entries().await.unwrap().len(), 20);
    }
}
