//! Top-level entry point
//!
//! Resolves a dataset split, creates a timestamped run directory and hands
//! everything to the [`BenchmarkDriver`].

use std::path::PathBuf;

use chrono::Local;
use tokio_util::sync::CancellationToken;

use crate::benchmarks::{DatasetKind, benchmark_for};
use crate::datasets::{DatasetLoader, Split};
use crate::error::BenchResult;
use crate::runner::{BenchConfig, BenchmarkDriver, ProgressCallback, RunOutcome};
use crate::workflow::Workflow;

/// Runs benchmarks according to a [`BenchConfig`]
pub struct Evaluator {
    config: BenchConfig,
    loader: DatasetLoader,
    progress_callback: Option<ProgressCallback>,
    cancel: Option<CancellationToken>,
}

impl Evaluator {
    pub fn new(config: BenchConfig) -> Self {
        let loader = DatasetLoader::new(&config.data_dir);
        Self {
            config,
            loader,
            progress_callback: None,
            cancel: None,
        }
    }

    /// Set progress callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Abort runs when the token is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Directory for a new run of `kind`: `{output_dir}/{dataset}/{YYYYMMDD_HHMMSS}`
    pub fn run_dir_for(&self, kind: DatasetKind) -> PathBuf {
        self.config
            .output_dir
            .join(kind.name().to_lowercase())
            .join(Local::now().format("%Y%m%d_%H%M%S").to_string())
    }

    /// Evaluate `workflow` on one split of a dataset.
    ///
    /// `va_list` restricts the run to those record indices.
    pub async fn evaluate(
        &mut self,
        kind: DatasetKind,
        split: Split,
        workflow: &dyn Workflow,
        va_list: Option<&[usize]>,
    ) -> BenchResult<RunOutcome> {
        let dataset = self.loader.load(kind, split, va_list).await?;
        let run_dir = self.run_dir_for(kind);

        tracing::info!(
            dataset = %kind,
            split = %split,
            path = %dataset.path.display(),
            run_dir = %run_dir.display(),
            "Evaluating dataset"
        );

        let benchmark = benchmark_for(kind, &self.config);
        let mut driver = BenchmarkDriver::new(benchmark, self.config.profile(kind))
            .with_cost_aggregation(self.config.cost_aggregation);
        if let Some(callback) = self.progress_callback.take() {
            driver = driver.with_progress_callback(callback);
        }
        if let Some(token) = &self.cancel {
            driver = driver.with_cancellation(token.clone());
        }

        let outcome = driver.run(&dataset, workflow, &run_dir).await;

        // Hand the callback back for the next run
        self.progress_callback = driver.take_progress_callback();
        outcome
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .field("loader", &self.loader)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use crate::workflow::{Prediction, WorkflowInput};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn evaluator(dir: &TempDir) -> Evaluator {
        let config = BenchConfig::default()
            .with_data_dir(dir.path().join("data"))
            .with_output_dir(dir.path().join("results"))
            .with_profile(
                DatasetKind::Gsm8k,
                DatasetKind::Gsm8k
                    .default_profile()
                    .with_retry_delay(Duration::ZERO),
            );
        Evaluator::new(config)
    }

    fn write_data(dir: &TempDir, name: &str, records: &[serde_json::Value]) {
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        let lines: Vec<String> = records.iter().map(|r| r.to_string()).collect();
        std::fs::write(data.join(name), lines.join("\n")).unwrap();
    }

    #[test]
    fn test_run_dir_layout() {
        let dir = TempDir::new().unwrap();
        let run_dir = evaluator(&dir).run_dir_for(DatasetKind::HotpotQa);
        let parent = run_dir.parent().unwrap();
        assert_eq!(parent, dir.path().join("results").join("hotpotqa"));
        assert_eq!(run_dir.file_name().unwrap().len(), "20240101_120000".len());
    }

    #[tokio::test]
    async fn test_evaluate_selects_va_list() {
        let dir = TempDir::new().unwrap();
        write_data(
            &dir,
            "gsm8k_test.jsonl",
            &[
                json!({"question": "a", "answer": "#### 1"}),
                json!({"question": "b", "answer": "#### 2"}),
                json!({"question": "c", "answer": "#### 3"}),
            ],
        );
        let workflow = |_input: WorkflowInput| async {
            Ok::<_, anyhow::Error>(Prediction::new("The answer is 3", 0.5))
        };

        let outcome = evaluator(&dir)
            .evaluate(DatasetKind::Gsm8k, Split::Test, &workflow, Some(&[2, 9][..]))
            .await
            .unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].inputs, "c");
        assert_eq!(outcome.triple(), (1.0, 0.5, 0.5));
        assert!(outcome.report_path.starts_with(dir.path().join("results").join("gsm8k")));
    }

    #[tokio::test]
    async fn test_missing_split_is_dataset_error() {
        let dir = TempDir::new().unwrap();
        let workflow = |_input: WorkflowInput| async {
            Ok::<_, anyhow::Error>(Prediction::new("", 0.0))
        };

        let err = evaluator(&dir)
            .evaluate(DatasetKind::Gsm8k, Split::Validate, &workflow, None)
            .await
            .unwrap_err();
        assert!(err.is_dataset_error());
        assert!(matches!(err, BenchError::DatasetIo { .. }));
    }
}
