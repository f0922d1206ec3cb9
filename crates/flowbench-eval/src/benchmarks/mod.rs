//! Benchmark registry
//!
//! Maps each supported dataset to the adapter that turns its records into
//! workflow inputs and scores the predictions.

mod code;
mod drop;
mod gsm8k;
mod hotpotqa;
mod math;

pub use code::{HumanEval, Mbpp};
pub use drop::DropBench;
pub use gsm8k::Gsm8k;
pub use hotpotqa::HotpotQa;
pub use math::MathBench;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BenchError;
use crate::runner::{BenchConfig, FamilyProfile};
use crate::sandbox::CodeRunner;
use crate::scoring::{Answer, ScoreOutcome};
use crate::workflow::WorkflowInput;

/// Supported datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    #[serde(rename = "GSM8K")]
    Gsm8k,
    #[serde(rename = "MATH")]
    Math,
    #[serde(rename = "HotpotQA")]
    HotpotQa,
    #[serde(rename = "DROP")]
    Drop,
    #[serde(rename = "HumanEval")]
    HumanEval,
    #[serde(rename = "MBPP")]
    Mbpp,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 6] = [
        DatasetKind::Gsm8k,
        DatasetKind::Math,
        DatasetKind::HotpotQa,
        DatasetKind::Drop,
        DatasetKind::HumanEval,
        DatasetKind::Mbpp,
    ];

    /// Canonical dataset name
    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Gsm8k => "GSM8K",
            DatasetKind::Math => "MATH",
            DatasetKind::HotpotQa => "HotpotQA",
            DatasetKind::Drop => "DROP",
            DatasetKind::HumanEval => "HumanEval",
            DatasetKind::Mbpp => "MBPP",
        }
    }

    /// Whether predictions are code checked in the sandbox
    pub fn is_code(&self) -> bool {
        matches!(self, DatasetKind::HumanEval | DatasetKind::Mbpp)
    }

    /// Built-in concurrency, retry and timeout settings
    pub fn default_profile(&self) -> FamilyProfile {
        let (max_concurrent_tasks, max_attempts) = match self {
            DatasetKind::Gsm8k => (50, 5),
            DatasetKind::Math => (30, 2),
            DatasetKind::HotpotQa => (20, 5),
            DatasetKind::Drop => (25, 5),
            DatasetKind::HumanEval | DatasetKind::Mbpp => (50, 5),
        };
        let call_timeout = self.is_code().then(|| Duration::from_secs(60));

        FamilyProfile {
            max_concurrent_tasks,
            max_attempts,
            call_timeout,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Whether a score is low enough to record in the mismatch log
    pub fn is_mismatch(&self, score: f64) -> bool {
        match self {
            DatasetKind::Drop => score < 0.3,
            _ => score == 0.0,
        }
    }

    /// Report columns, in order
    pub fn columns(&self) -> &'static [Column] {
        use Column::*;
        match self {
            DatasetKind::Gsm8k | DatasetKind::Math => {
                &[Question, Prediction, ExpectedOutput, Score, Cost]
            }
            DatasetKind::HotpotQa => &[Question, Context, Prediction, ExpectedOutput, Score, Cost],
            DatasetKind::Drop | DatasetKind::HumanEval | DatasetKind::Mbpp => {
                &[Inputs, Prediction, ExpectedOutput, Score, Cost]
            }
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BenchError::UnknownDataset(s.to_string()))
    }
}

/// A report column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Question,
    Inputs,
    Context,
    Prediction,
    ExpectedOutput,
    Score,
    Cost,
}

impl Column {
    /// Header text
    pub fn header(&self) -> &'static str {
        match self {
            Column::Question => "question",
            Column::Inputs => "inputs",
            Column::Context => "context",
            Column::Prediction => "prediction",
            Column::ExpectedOutput => "expected_output",
            Column::Score => "score",
            Column::Cost => "cost",
        }
    }
}

/// A dataset record turned into everything one evaluation needs
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedItem {
    /// What the workflow receives
    pub input: WorkflowInput,
    /// Question (or raw inputs) shown in the report and mismatch log
    pub question: String,
    /// Assembled context, for families that report it
    pub context: Option<String>,
    /// What predictions are scored against (the test source for code families)
    pub reference: String,
    /// Reference as shown in the report and mismatch log
    pub expected_output: Answer,
}

/// One dataset family
#[async_trait]
pub trait Benchmark: Send + Sync {
    fn kind(&self) -> DatasetKind;

    /// Build the workflow input and references from a raw record.
    ///
    /// Errors describe the malformed field.
    fn prepare(&self, record: &Value) -> Result<PreparedItem, String>;

    /// Score a prediction for a prepared item
    async fn evaluate(&self, item: &PreparedItem, prediction: &str) -> ScoreOutcome;
}

/// Look up the benchmark for a dataset
pub fn benchmark_for(kind: DatasetKind, config: &BenchConfig) -> Arc<dyn Benchmark> {
    match kind {
        DatasetKind::Gsm8k => Arc::new(Gsm8k::new()),
        DatasetKind::Math => Arc::new(MathBench::new(config.symbolic_timeout)),
        DatasetKind::HotpotQa => Arc::new(HotpotQa::new()),
        DatasetKind::Drop => Arc::new(DropBench::new()),
        DatasetKind::HumanEval => Arc::new(HumanEval::new(CodeRunner::new(config.sandbox.clone()))),
        DatasetKind::Mbpp => Arc::new(Mbpp::new(CodeRunner::new(config.sandbox.clone()))),
    }
}

/// Required string field of a record
pub(crate) fn str_field<'a>(record: &'a Value, field: &str) -> Result<&'a str, String> {
    match record.get(field) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(format!("field `{}` must be a string, got {}", field, other)),
        None => Err(format!("missing field `{}`", field)),
    }
}

/// Optional string field; missing and `null` both read as empty
pub(crate) fn opt_str_field<'a>(record: &'a Value, field: &str) -> Result<&'a str, String> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(""),
        Some(_) => str_field(record, field),
    }
}
