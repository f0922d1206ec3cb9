//! MATH: competition problems with boxed answers

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{Benchmark, DatasetKind, PreparedItem, str_field};
use crate::scoring::{Answer, MathScorer, ScoreOutcome, Scorer};
use crate::workflow::WorkflowInput;

#[derive(Debug, Clone, Default)]
pub struct MathBench {
    scorer: MathScorer,
}

impl MathBench {
    pub fn new(symbolic_timeout: Duration) -> Self {
        Self {
            scorer: MathScorer::new(symbolic_timeout),
        }
    }
}

#[async_trait]
impl Benchmark for MathBench {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Math
    }

    fn prepare(&self, record: &Value) -> Result<PreparedItem, String> {
        let problem = str_field(record, "problem")?;
        let solution = str_field(record, "solution")?;

        Ok(PreparedItem {
            input: WorkflowInput::text(problem),
            question: problem.to_string(),
            context: None,
            reference: solution.to_string(),
            expected_output: Answer::from(solution),
        })
    }

    async fn evaluate(&self, item: &PreparedItem, prediction: &str) -> ScoreOutcome {
        self.scorer.score(&item.reference, prediction).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_boxed_equality() {
        let bench = MathBench::new(Duration::from_secs(5));
        let item = bench
            .prepare(&json!({
                "problem": "What is 1/2 as a decimal?",
                "solution": "Dividing gives \\boxed{\\frac{1}{2}}"
            }))
            .unwrap();

        let outcome = bench.evaluate(&item, "So the answer is \\boxed{0.5}.").await;
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.extracted, Answer::from("0.5"));

        let outcome = bench.evaluate(&item, "\\boxed{0.25}").await;
        assert_eq!(outcome.score, 0.0);
    }
}
