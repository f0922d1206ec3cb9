//! Run artifacts
//!
//! Each run directory receives a CSV report named after the run's average
//! score and a `log.json` array of items that scored below the family's
//! threshold.

mod csv;
mod mismatch;
mod summary;

pub use self::csv::{ReportWriter, report_file_name};
pub use mismatch::{MismatchEntry, MismatchLog};
pub use summary::{CostAggregation, RunSummary};

use serde::{Deserialize, Serialize};

use crate::benchmarks::Column;
use crate::scoring::{Answer, format_number};

/// One report row per dataset item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    /// Question or raw workflow inputs
    pub inputs: String,
    /// Assembled context (HotpotQA)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Workflow output, or the error text if no output was produced
    pub prediction: String,
    pub expected_output: Answer,
    /// Score in `[0, 1]`
    pub score: f64,
    /// Cost reported with the prediction
    pub cost: f64,
}

impl EvaluationRow {
    /// Cell text for a report column
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Question | Column::Inputs => self.inputs.clone(),
            Column::Context => self.context.clone().unwrap_or_default(),
            Column::Prediction => self.prediction.clone(),
            Column::ExpectedOutput => self.expected_output.to_string(),
            Column::Score => format_number(self.score),
            Column::Cost => format_number(self.cost),
        }
    }
}
