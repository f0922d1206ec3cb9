//! HumanEval and MBPP: function synthesis checked by running the tests

use async_trait::async_trait;
use serde_json::Value;

use super::{Benchmark, DatasetKind, PreparedItem, opt_str_field, str_field};
use crate::sandbox::CodeRunner;
use crate::scoring::{Answer, ScoreOutcome};
use crate::workflow::WorkflowInput;

/// Run a prediction against the item's test source
async fn check(runner: &CodeRunner, item: &PreparedItem, prediction: &str) -> ScoreOutcome {
    let entry_point = match &item.input {
        WorkflowInput::Code { entry_point, .. } => entry_point.as_str(),
        WorkflowInput::Text { .. } => "",
    };
    let result = runner.run(prediction, &item.reference, entry_point).await;
    ScoreOutcome::new(result.score(), Answer::Text(result.detail))
}

fn prepare_code(record: &Value, expected_output: String) -> Result<PreparedItem, String> {
    let prompt = str_field(record, "prompt")?;
    let entry_point = str_field(record, "entry_point")?;
    let test = str_field(record, "test")?;

    Ok(PreparedItem {
        input: WorkflowInput::code(prompt, entry_point),
        question: prompt.to_string(),
        context: None,
        reference: test.to_string(),
        expected_output: Answer::Text(expected_output),
    })
}

#[derive(Debug, Clone)]
pub struct HumanEval {
    runner: CodeRunner,
}

impl HumanEval {
    pub fn new(runner: CodeRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Benchmark for HumanEval {
    fn kind(&self) -> DatasetKind {
        DatasetKind::HumanEval
    }

    fn prepare(&self, record: &Value) -> Result<PreparedItem, String> {
        let entry_point = str_field(record, "entry_point")?;
        let canonical = opt_str_field(record, "canonical_solution")?;
        let expected = format!(
            "\nCorrect Solution:\ndef {}(params you should put here):\n\n{}",
            entry_point, canonical
        );
        prepare_code(record, expected)
    }

    async fn evaluate(&self, item: &PreparedItem, prediction: &str) -> ScoreOutcome {
        check(&self.runner, item, prediction).await
    }
}

#[derive(Debug, Clone)]
pub struct Mbpp {
    runner: CodeRunner,
}

impl Mbpp {
    pub fn new(runner: CodeRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Benchmark for Mbpp {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Mbpp
    }

    fn prepare(&self, record: &Value) -> Result<PreparedItem, String> {
        let code = opt_str_field(record, "code")?;
        prepare_code(record, format!("\nCorrect Solution:\n{}", code))
    }

    async fn evaluate(&self, item: &PreparedItem, prediction: &str) -> ScoreOutcome {
        check(&self.runner, item, prediction).await
    }
}
