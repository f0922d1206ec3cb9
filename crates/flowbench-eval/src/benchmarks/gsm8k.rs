//! GSM8K: grade-school arithmetic word problems

use async_trait::async_trait;
use serde_json::Value;

use super::{Benchmark, DatasetKind, PreparedItem, str_field};
use crate::scoring::{NumericScorer, ScoreOutcome, Scorer};
use crate::workflow::WorkflowInput;

/// Numeric answers; the gold number is the last number of `answer`
#[derive(Debug, Clone, Default)]
pub struct Gsm8k {
    scorer: NumericScorer,
}

impl Gsm8k {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Benchmark for Gsm8k {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Gsm8k
    }

    fn prepare(&self, record: &Value) -> Result<PreparedItem, String> {
        let question = str_field(record, "question")?;
        let answer = str_field(record, "answer")?;

        Ok(PreparedItem {
            input: WorkflowInput::text(question),
            question: question.to_string(),
            context: None,
            reference: answer.to_string(),
            expected_output: self.scorer.expected_answer(answer),
        })
    }

    async fn evaluate(&self, item: &PreparedItem, prediction: &str) -> ScoreOutcome {
        self.scorer.score(&item.reference, prediction).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Answer;
    use serde_json::json;

    #[tokio::test]
    async fn test_prepare_and_evaluate() {
        let bench = Gsm8k::new();
        let item = bench
            .prepare(&json!({"question": "Q: 3 apples + 4 apples?", "answer": "3 + 4 = 7\n#### 7"}))
            .unwrap();
        assert_eq!(item.input, WorkflowInput::text("Q: 3 apples + 4 apples?"));
        assert_eq!(item.expected_output, Answer::Number(7.0));

        assert_eq!(bench.evaluate(&item, "The answer is 7.").await.score, 1.0);
        assert_eq!(bench.evaluate(&item, "6").await.score, 0.0);
    }

    #[test]
    fn test_missing_answer() {
        let err = Gsm8k::new().prepare(&json!({"question": "Q"})).unwrap_err();
        assert_eq!(err, "missing field `answer`");
    }
}
