//! Benchmark driver
//!
//! Fans out one evaluation per dataset record on the current task, bounded
//! by a [`ConcurrencyGate`], then writes the report. All item futures are
//! polled together by `join_all`; nothing is spawned, so the run stays a
//! single cooperative task and can be dropped as a whole.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::config::FamilyProfile;
use super::gate::ConcurrencyGate;
use super::progress::{EvalProgress, ProgressCallback};
use super::retry::{AttemptOutcome, call_with_retry};
use crate::benchmarks::{Benchmark, PreparedItem};
use crate::datasets::Dataset;
use crate::error::{BenchError, BenchResult};
use crate::report::{
    CostAggregation, EvaluationRow, MismatchEntry, MismatchLog, ReportWriter, RunSummary,
};
use crate::workflow::Workflow;

/// File name of the mismatch log inside a run directory
pub const MISMATCH_LOG_FILE: &str = "log.json";

/// What a finished run reports back
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub avg_score: f64,
    /// Average cost per item
    pub avg_cost: f64,
    pub total_cost: f64,
    pub report_path: PathBuf,
    pub mismatch_log: PathBuf,
    pub rows: Vec<EvaluationRow>,
}

impl RunOutcome {
    /// `(avg_score, avg_cost_per_item, total_cost)`
    pub fn triple(&self) -> (f64, f64, f64) {
        (self.avg_score, self.avg_cost, self.total_cost)
    }
}

/// Runs one benchmark over a dataset with one workflow
pub struct BenchmarkDriver {
    benchmark: Arc<dyn Benchmark>,
    profile: FamilyProfile,
    cost_aggregation: CostAggregation,
    progress_callback: Option<ProgressCallback>,
    cancel: Option<CancellationToken>,
    gate: Option<Arc<ConcurrencyGate>>,
}

impl BenchmarkDriver {
    pub fn new(benchmark: Arc<dyn Benchmark>, profile: FamilyProfile) -> Self {
        Self {
            benchmark,
            profile,
            cost_aggregation: CostAggregation::default(),
            progress_callback: None,
            cancel: None,
            gate: None,
        }
    }

    /// Set cost aggregation
    pub fn with_cost_aggregation(mut self, aggregation: CostAggregation) -> Self {
        self.cost_aggregation = aggregation;
        self
    }

    /// Set progress callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Remove the progress callback so it can be reused
    pub fn take_progress_callback(&mut self) -> Option<ProgressCallback> {
        self.progress_callback.take()
    }

    /// Abort the run when the token is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Use an existing gate instead of one sized from the profile
    pub fn with_gate(mut self, gate: Arc<ConcurrencyGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Evaluate every record and write the run artifacts into `run_dir`.
    ///
    /// Malformed records abort the run before any workflow call. On
    /// cancellation in-flight items are dropped and no report is written.
    pub async fn run(
        &self,
        dataset: &Dataset,
        workflow: &dyn Workflow,
        run_dir: &Path,
    ) -> BenchResult<RunOutcome> {
        let kind = self.benchmark.kind();
        let items = self.prepare_items(dataset)?;

        tokio::fs::create_dir_all(run_dir)
            .await
            .map_err(|e| BenchError::output(run_dir, e))?;
        let mismatch_log = MismatchLog::open(run_dir.join(MISMATCH_LOG_FILE)).await?;

        tracing::info!(
            dataset = %kind,
            items = items.len(),
            max_concurrent_tasks = self.profile.max_concurrent_tasks,
            "Starting benchmark run"
        );

        let gate = match &self.gate {
            Some(gate) => gate.clone(),
            None => Arc::new(ConcurrencyGate::new(self.profile.max_concurrent_tasks)),
        };
        let completed = AtomicUsize::new(0);
        let total = items.len();

        let evaluations = join_all(items.iter().map(|item| {
            self.evaluate_item(item, workflow, &gate, &mismatch_log, &completed, total)
        }));

        let results = match &self.cancel {
            Some(token) => tokio::select! {
                results = evaluations => results,
                _ = token.cancelled() => {
                    tracing::warn!(dataset = %kind, "Benchmark run cancelled");
                    return Err(BenchError::Cancelled);
                }
            },
            None => evaluations.await,
        };
        let rows = results.into_iter().collect::<BenchResult<Vec<_>>>()?;

        let summary = RunSummary::from_rows(&rows, self.cost_aggregation);
        let report_path = ReportWriter::new(run_dir)
            .write(kind.columns(), &rows, &summary)
            .await?;

        tracing::info!(
            dataset = %kind,
            avg_score = summary.avg_score,
            total_cost = summary.total_cost,
            report = %report_path.display(),
            "Finished benchmark run"
        );

        Ok(RunOutcome {
            avg_score: summary.avg_score,
            avg_cost: summary.avg_cost,
            total_cost: summary.total_cost,
            report_path,
            mismatch_log: mismatch_log.path().to_path_buf(),
            rows,
        })
    }

    fn prepare_items(&self, dataset: &Dataset) -> BenchResult<Vec<PreparedItem>> {
        dataset
            .records
            .iter()
            .map(|record| {
                self.benchmark
                    .prepare(&record.value)
                    .map_err(|message| BenchError::DatasetParse {
                        path: dataset.path.clone(),
                        line: record.line,
                        message,
                    })
            })
            .collect()
    }

    async fn evaluate_item(
        &self,
        item: &PreparedItem,
        workflow: &dyn Workflow,
        gate: &ConcurrencyGate,
        mismatch_log: &MismatchLog,
        completed: &AtomicUsize,
        total: usize,
    ) -> BenchResult<EvaluationRow> {
        let _permit = gate.acquire().await?;
        let kind = self.benchmark.kind();

        let row = match call_with_retry(workflow, &item.input, &self.profile).await {
            AttemptOutcome::Completed { prediction, .. } => {
                let outcome = self.benchmark.evaluate(item, &prediction.text).await;

                if kind.is_mismatch(outcome.score) {
                    mismatch_log
                        .append(&MismatchEntry {
                            question: item.question.clone(),
                            right_answer: item.expected_output.clone(),
                            model_output: prediction.text.clone(),
                            extracted_output: outcome.extracted.clone(),
                        })
                        .await?;
                }

                tracing::debug!(dataset = %kind, score = outcome.score, "Scored item");
                self.row(item, prediction.text, outcome.score, prediction.cost)
            }
            failed => {
                let error = failed.error_text().unwrap_or_default();
                tracing::warn!(
                    dataset = %kind,
                    attempts = failed.attempts(),
                    error = %error,
                    "Item produced no prediction"
                );
                self.row(item, error, 0.0, 0.0)
            }
        };

        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(callback) = &self.progress_callback {
            callback(EvalProgress {
                dataset: kind,
                completed: done,
                total,
                score: row.score,
            });
        }

        Ok(row)
    }

    fn row(&self, item: &PreparedItem, prediction: String, score: f64, cost: f64) -> EvaluationRow {
        EvaluationRow {
            inputs: item.question.clone(),
            context: item.context.clone(),
            prediction,
            expected_output: item.expected_output.clone(),
            score,
            cost,
        }
    }
}

impl std::fmt::Debug for BenchmarkDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkDriver")
            .field("dataset", &self.benchmark.kind())
            .field("profile", &self.profile)
            .field("cost_aggregation", &self.cost_aggregation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::{DatasetKind, Gsm8k};
    use crate::datasets::Record;
    use crate::workflow::{Prediction, WorkflowInput};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn dataset(values: Vec<serde_json::Value>) -> Dataset {
        Dataset {
            path: PathBuf::from("gsm8k_validate.jsonl"),
            records: values
                .into_iter()
                .enumerate()
                .map(|(i, value)| Record { line: i + 1, value })
                .collect(),
        }
    }

    fn driver() -> BenchmarkDriver {
        let profile = DatasetKind::Gsm8k
            .default_profile()
            .with_retry_delay(Duration::ZERO);
        BenchmarkDriver::new(Arc::new(Gsm8k::new()), profile)
    }

    #[tokio::test]
    async fn test_malformed_record_aborts_before_calls() {
        let dir = TempDir::new().unwrap();
        let data = dataset(vec![
            json!({"question": "q", "answer": "#### 1"}),
            json!({"question": "q"}),
        ]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let workflow = move |_input: WorkflowInput| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(Prediction::new("1", 0.0)) }
        };

        let err = driver().run(&data, &workflow, dir.path()).await.unwrap_err();
        assert!(matches!(err, BenchError::DatasetParse { line: 2, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_items_score_zero_with_error_text() {
        let dir = TempDir::new().unwrap();
        let data = dataset(vec![json!({"question": "q", "answer": "#### 1"})]);
        let workflow = |_input: WorkflowInput| async {
            Err::<Prediction, _>(anyhow::anyhow!("provider unavailable"))
        };

        let outcome = driver().run(&data, &workflow, dir.path()).await.unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].prediction, "provider unavailable");
        assert_eq!(outcome.rows[0].score, 0.0);
        assert_eq!(outcome.rows[0].cost, 0.0);
        assert_eq!(outcome.triple(), (0.0, 0.0, 0.0));
        assert!(outcome.mismatch_log.exists());
    }

    #[tokio::test]
    async fn test_progress_reports_every_item() {
        let dir = TempDir::new().unwrap();
        let data = dataset(vec![
            json!({"question": "1", "answer": "#### 1"}),
            json!({"question": "2", "answer": "#### 2"}),
            json!({"question": "3", "answer": "#### 3"}),
        ]);
        let workflow = |input: WorkflowInput| async move {
            Ok::<_, anyhow::Error>(Prediction::new(input.prompt().to_string(), 0.0))
        };

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let driver = driver().with_progress_callback(Box::new(move |progress| {
            sink.lock().unwrap().push(progress.completed);
        }));

        let outcome = driver.run(&data, &workflow, dir.path()).await.unwrap();
        assert_eq!(outcome.avg_score, 1.0);

        let mut seen = seen.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, [1, 2, 3]);
    }
}
