//! JSON-Lines dataset loading with optional index selection

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::benchmarks::DatasetKind;
use crate::error::{BenchError, BenchResult};

/// Which half of a dataset to evaluate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    #[default]
    Validate,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Validate => "validate",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record and the 1-based line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub value: Value,
}

/// Records loaded from one file
#[derive(Debug, Clone)]
pub struct Dataset {
    pub path: PathBuf,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep only the records at `indices`, in that order.
    ///
    /// Out-of-range indices are dropped silently.
    pub fn select(mut self, indices: &[usize]) -> Self {
        let records = std::mem::take(&mut self.records);
        self.records = indices
            .iter()
            .filter_map(|&i| records.get(i).cloned())
            .collect();
        self
    }
}

/// Resolves and reads dataset files under a data directory
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    data_dir: PathBuf,
}

impl DatasetLoader {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// `{data_dir}/{dataset}_{split}.jsonl`, dataset name lowercased
    pub fn path_for(&self, kind: DatasetKind, split: Split) -> PathBuf {
        self.data_dir.join(format!(
            "{}_{}.jsonl",
            kind.name().to_lowercase(),
            split.as_str()
        ))
    }

    /// Load a dataset split, optionally restricted to `va_list` indices
    pub async fn load(
        &self,
        kind: DatasetKind,
        split: Split,
        va_list: Option<&[usize]>,
    ) -> BenchResult<Dataset> {
        let dataset = Self::load_file(self.path_for(kind, split)).await?;
        Ok(match va_list {
            Some(indices) => dataset.select(indices),
            None => dataset,
        })
    }

    /// Read one JSON value per non-blank line
    pub async fn load_file(path: impl AsRef<Path>) -> BenchResult<Dataset> {
        let path = path.as_ref().to_path_buf();
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| BenchError::DatasetIo {
                path: path.clone(),
                source,
            })?;

        let records = parse_lines(&path, &content)?;
        tracing::debug!(path = %path.display(), records = records.len(), "Loaded dataset");
        Ok(Dataset { path, records })
    }
}

fn parse_lines(path: &Path, content: &str) -> BenchResult<Vec<Record>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map(|value| Record { line: i + 1, value })
                .map_err(|e| BenchError::DatasetParse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    message: e.to_string(),
                })
        })
        .collect()
}
