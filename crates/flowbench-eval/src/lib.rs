//! Flowbench Evaluation Harness
//!
//! Runs a candidate workflow over standard benchmark datasets, scores every
//! answer and records the run.
//!
//! # Features
//!
//! - **Scorers**: span F1 (HotpotQA), pipe-max F1 (DROP), last-number matching
//!   (GSM8K) and math equivalence with a native symbolic check (MATH)
//! - **Code Checks**: HumanEval and MBPP solutions are sanitized and executed
//!   against their tests in a child interpreter with a timeout
//! - **Bounded Runs**: per-family concurrency limits, retries and call timeouts
//! - **Run Artifacts**: a per-item CSV report named after the average score and
//!   a `log.json` array of mismatches
//!
//! # Example
//!
//! ```rust,ignore
//! use flowbench_eval::{BenchConfig, DatasetKind, Evaluator, Prediction, Split, WorkflowInput};
//!
//! let workflow = |input: WorkflowInput| async move {
//!     let answer = call_model(input.prompt()).await?;
//!     Ok(Prediction::new(answer.text, answer.cost))
//! };
//!
//! let mut evaluator = Evaluator::new(BenchConfig::default());
//! let outcome = evaluator
//!     .evaluate(DatasetKind::Gsm8k, Split::Validate, &workflow, None)
//!     .await?;
//! let (avg_score, avg_cost, total_cost) = outcome.triple();
//! ```

pub mod benchmarks;
pub mod datasets;
pub mod error;
pub mod evaluator;
pub mod report;
pub mod runner;
pub mod sandbox;
pub mod scoring;
pub mod workflow;

// Re-exports for convenience
pub use benchmarks::{Benchmark, DatasetKind, benchmark_for};
pub use datasets::{Dataset, DatasetLoader, Split};
pub use error::{BenchError, BenchResult};
pub use evaluator::Evaluator;
pub use report::{CostAggregation, EvaluationRow, MismatchEntry, RunSummary};
pub use runner::{BenchConfig, BenchmarkDriver, FamilyProfile, RunOutcome, SandboxConfig};
pub use sandbox::{CheckResult, CodeRunner};
pub use scoring::{Answer, ScoreOutcome, Scorer};
pub use workflow::{Prediction, Workflow, WorkflowInput};
