//! Competition-math scoring
//!
//! The answer is the last `\boxed{...}` expression (or the last sentence),
//! compared through [`MathEquality`]. Symbolic checks are CPU-bound, so they
//! run on the blocking pool and never stall the event loop.

mod equal;
pub mod expr;
mod extract;

pub use equal::{MathEquality, parse_digits};
pub use extract::{extract_model_answer, last_boxed, last_sentence};

use std::time::Duration;

use async_trait::async_trait;

use super::{Answer, ScoreOutcome, Scorer};

/// Scorer for boxed competition-math answers
#[derive(Debug, Clone, Default)]
pub struct MathScorer {
    equality: MathEquality,
}

impl MathScorer {
    /// Create a scorer with the given symbolic budget
    pub fn new(symbolic_timeout: Duration) -> Self {
        Self {
            equality: MathEquality::default().with_symbolic_timeout(symbolic_timeout),
        }
    }
}

#[async_trait]
impl Scorer for MathScorer {
    fn name(&self) -> &'static str {
        "math"
    }

    fn expected_answer(&self, expected: &str) -> Answer {
        Answer::Text(extract_model_answer(expected))
    }

    async fn score(&self, expected: &str, predicted: &str) -> ScoreOutcome {
        let expected_answer = extract_model_answer(expected);
        let predicted_answer = extract_model_answer(predicted);

        let equality = self.equality.clone();
        let prediction = predicted_answer.clone();
        let equal = tokio::task::spawn_blocking(move || {
            equality.math_equal(&prediction, &expected_answer)
        })
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Math equality check did not complete");
            false
        });

        if equal {
            ScoreOutcome::pass(Answer::Text(predicted_answer))
        } else {
            ScoreOutcome::fail(Answer::Text(predicted_answer))
        }
    }
}
