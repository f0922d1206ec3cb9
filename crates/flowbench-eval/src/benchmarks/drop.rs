//! DROP: discrete reasoning over paragraphs
//!
//! The workflow gets the raw `context` (passage plus question). References
//! list `|`-separated alternatives and the best-matching pair counts.

use async_trait::async_trait;
use serde_json::Value;

use super::{Benchmark, DatasetKind, PreparedItem, str_field};
use crate::scoring::{Answer, PipeMaxF1Scorer, ScoreOutcome, Scorer};
use crate::workflow::WorkflowInput;

#[derive(Debug, Clone, Default)]
pub struct DropBench {
    scorer: PipeMaxF1Scorer,
}

impl DropBench {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Benchmark for DropBench {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Drop
    }

    fn prepare(&self, record: &Value) -> Result<PreparedItem, String> {
        let context = str_field(record, "context")?;
        let ref_text = str_field(record, "ref_text")?;

        Ok(PreparedItem {
            input: WorkflowInput::text(context),
            question: context.to_string(),
            context: None,
            reference: ref_text.to_string(),
            expected_output: Answer::from(ref_text),
        })
    }

    async fn evaluate(&self, item: &PreparedItem, prediction: &str) -> ScoreOutcome {
        self.scorer.score(&item.reference, prediction).await
    }
}
