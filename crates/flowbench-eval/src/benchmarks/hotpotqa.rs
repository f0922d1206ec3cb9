//! HotpotQA: multi-hop questions over supplied paragraphs

use async_trait::async_trait;
use serde_json::Value;

use super::{Benchmark, DatasetKind, PreparedItem, str_field};
use crate::scoring::{Answer, ScoreOutcome, Scorer, SpanF1Scorer};
use crate::workflow::WorkflowInput;

#[derive(Debug, Clone, Default)]
pub struct HotpotQa {
    scorer: SpanF1Scorer,
}

impl HotpotQa {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Join `[[title, [sentences...]], ...]` into one paragraph per line.
///
/// Entries whose second element is not a list of strings are skipped.
fn assemble_context(context: &Value) -> String {
    let Some(paragraphs) = context.as_array() else {
        return String::new();
    };

    paragraphs
        .iter()
        .filter_map(|item| item.get(1)?.as_array())
        .map(|sentences| {
            sentences
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Benchmark for HotpotQa {
    fn kind(&self) -> DatasetKind {
        DatasetKind::HotpotQa
    }

    fn prepare(&self, record: &Value) -> Result<PreparedItem, String> {
        let question = str_field(record, "question")?;
        let answer = str_field(record, "answer")?;
        let context = assemble_context(record.get("context").unwrap_or(&Value::Null));

        let input = format!("Context:\n{}\n\nQuestion:\n{}\n\nAnswer:", context, question);
        Ok(PreparedItem {
            input: WorkflowInput::text(input),
            question: question.to_string(),
            context: Some(context),
            reference: answer.to_string(),
            expected_output: Answer::from(answer),
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

    fn record() -> Value {
        json!({
            "question": "Who was the 44th president?",
            "answer": "Barack Obama",
            "context": [
                ["Obama", ["Barack Obama was", "the 44th president."]],
                ["Chicago", ["He lived in Chicago."]],
                ["Broken", "not a list"]
            ]
        })
    }

    #[test]
    fn test_input_assembly() {
        let item = HotpotQa::new().prepare(&record()).unwrap();
        let context = "Barack Obama was the 44th president.\nHe lived in Chicago.";
        assert_eq!(item.context.as_deref(), Some(context));
        assert_eq!(
            item.input,
            WorkflowInput::text(format!(
                "Context:\n{}\n\nQuestion:\nWho was the 44th president?\n\nAnswer:",
                context
            ))
        );
        assert_eq!(item.question, "Who was the 44th president?");
    }

    #[tokio::test]
    async fn test_span_f1() {
        let bench = HotpotQa::new();
        let item = bench.prepare(&record()).unwrap();
        let outcome = bench.evaluate(&item, "barack hussein obama").await;
        assert!((outcome.score - 0.8).abs() < 1e-9);
        assert!(!DatasetKind::HotpotQa.is_mismatch(outcome.score));
    }
}
