//! Error types for benchmark runs
//!
//! Only failures that abort a run surface here. Workflow errors, scoring
//! failures, and sandbox failures are folded into evaluation rows instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for harness operations
pub type BenchResult<T> = Result<T, BenchError>;

/// Errors that abort a benchmark run
#[derive(Error, Debug)]
pub enum BenchError {
    /// Dataset file could not be read
    #[error("Failed to read dataset {path}: {source}")]
    DatasetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dataset line is not a valid record
    #[error("Invalid record at {path}:{line}: {message}")]
    DatasetParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Dataset name has no registered benchmark
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    /// Report, mismatch log, or run directory I/O failed
    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV report encoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was cancelled before all items completed
    #[error("Benchmark run was cancelled")]
    Cancelled,
}

impl BenchError {
    /// Wrap an output-side I/O error with the path involved
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }

    /// Check if this error came from loading the dataset
    pub fn is_dataset_error(&self) -> bool {
        matches!(self, Self::DatasetIo { .. } | Self::DatasetParse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BenchError::DatasetParse {
            path: PathBuf::from("gsm8k_validate.jsonl"),
            line: 3,
            message: "expected value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid record at gsm8k_validate.jsonl:3: expected value"
        );
        assert!(err.is_dataset_error());
        assert!(!BenchError::Cancelled.is_dataset_error());
    }
}
