//! Answer scoring for text benchmark families
//!
//! Each scorer normalizes a prediction the way its task family expects and
//! compares it to the reference. Scorers never fail: an answer that cannot be
//! extracted simply scores zero.

mod f1;
pub mod math;
mod numeric;

pub use f1::{PipeMaxF1Scorer, SpanF1Scorer, f1_score, normalize_answer};
pub use math::{MathEquality, MathScorer};
pub use numeric::{NumericScorer, extract_number};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A normalized answer as it appears in reports and mismatch logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// A parsed numeric answer
    Number(f64),
    /// Free-form text
    Text(String),
    /// Nothing could be extracted
    Missing,
}

impl Answer {
    /// Build a numeric answer from an optional extraction
    pub fn from_number(value: Option<f64>) -> Self {
        value.map(Answer::Number).unwrap_or(Answer::Missing)
    }

    /// Numeric value, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Answer::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Number(value) => f.write_str(&format_number(*value)),
            Answer::Text(text) => f.write_str(text),
            Answer::Missing => f.write_str("None"),
        }
    }
}

impl From<String> for Answer {
    fn from(text: String) -> Self {
        Answer::Text(text)
    }
}

impl From<&str> for Answer {
    fn from(text: &str) -> Self {
        Answer::Text(text.to_string())
    }
}

/// Format a number the way the reports have always shown it: integral values
/// keep one decimal place (`7.0`), others use the shortest exact form.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Result of scoring one prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOutcome {
    /// Score in `[0, 1]`
    pub score: f64,
    /// Normalized form of the prediction used for logging
    pub extracted: Answer,
}

impl ScoreOutcome {
    /// Create an outcome; non-finite scores become 0 and the rest is clamped to `[0, 1]`
    pub fn new(score: f64, extracted: Answer) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { score, extracted }
    }

    /// Full-credit outcome
    pub fn pass(extracted: Answer) -> Self {
        Self::new(1.0, extracted)
    }

    /// Zero-credit outcome
    pub fn fail(extracted: Answer) -> Self {
        Self::new(0.0, extracted)
    }
}

/// Scorer for one task family
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Short scorer name for logs
    fn name(&self) -> &'static str;

    /// Normalized form of the reference shown in reports
    fn expected_answer(&self, expected: &str) -> Answer {
        Answer::Text(expected.to_string())
    }

    /// Score a prediction against the reference
    async fn score(&self, expected: &str, predicted: &str) -> ScoreOutcome;
}
