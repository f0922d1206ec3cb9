//! Workflow contract
//!
//! A workflow is the candidate under evaluation: an async callable that takes
//! one problem and returns its prediction together with the cost it reports.
//! The harness treats it as a black box.

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Input handed to a workflow for one problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowInput {
    /// Raw question or a pre-assembled context + question string
    Text { text: String },
    /// Code-generation prompt plus the symbol the tests expect
    Code { prompt: String, entry_point: String },
}

impl WorkflowInput {
    /// Create a text input
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a code input
    pub fn code(prompt: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self::Code {
            prompt: prompt.into(),
            entry_point: entry_point.into(),
        }
    }

    /// The prompt text, whichever family this input belongs to
    pub fn prompt(&self) -> &str {
        match self {
            Self::Text { text } => text,
            Self::Code { prompt, .. } => prompt,
        }
    }
}

/// Output of one workflow call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Text produced by the workflow
    pub text: String,

    /// Cost reported by the provider layer, never negative.
    ///
    /// Under the default cumulative convention this is the provider's running
    /// total at the time the call finished, not the cost of this call alone.
    pub cost: f64,
}

impl Prediction {
    /// Create a prediction, clamping non-finite or negative costs to zero
    pub fn new(text: impl Into<String>, cost: f64) -> Self {
        let cost = if cost.is_finite() && cost > 0.0 { cost } else { 0.0 };
        Self {
            text: text.into(),
            cost,
        }
    }
}

impl From<(String, f64)> for Prediction {
    fn from((text, cost): (String, f64)) -> Self {
        Self::new(text, cost)
    }
}

/// The candidate under evaluation
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Solve one problem
    async fn call(&self, input: WorkflowInput) -> anyhow::Result<Prediction>;
}

#[async_trait]
impl<F, Fut> Workflow for F
where
    F: Fn(WorkflowInput) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Prediction>> + Send + 'static,
{
    async fn call(&self, input: WorkflowInput) -> anyhow::Result<Prediction> {
        (self)(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_clamps_cost() {
        assert_eq!(Prediction::new("x", -1.0).cost, 0.0);
        assert_eq!(Prediction::new("x", f64::NAN).cost, 0.0);
        assert_eq!(Prediction::new("x", 0.25).cost, 0.25);
    }

    #[test]
    fn test_input_prompt() {
        assert_eq!(WorkflowInput::text("Q?").prompt(), "Q?");
        assert_eq!(WorkflowInput::code("def f():", "f").prompt(), "def f():");
    }

    #[tokio::test]
    async fn test_closure_workflow() {
        let workflow = |input: WorkflowInput| async move {
            Ok::<_, anyhow::Error>(Prediction::new(input.prompt().to_uppercase(), 0.5))
        };

        let prediction = workflow.call(WorkflowInput::text("abc")).await.unwrap();
        assert_eq!(prediction.text, "ABC");
        assert_eq!(prediction.cost, 0.5);
    }
}
