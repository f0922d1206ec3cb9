//! Numeric answers for arithmetic word problems

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Answer, ScoreOutcome, Scorer};

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?\d+(?:,\d{3})*(?:\.\d+)?|\d+\.\d+").expect("number pattern is valid")
});

const TOLERANCE: f64 = 1e-6;

/// Extract the last number in the text, ignoring thousands separators
pub fn extract_number(text: &str) -> Option<f64> {
    let last = NUMBER.find_iter(text).last()?;
    last.as_str().replace(',', "").parse::<f64>().ok()
}

/// Scores 1 when the last numbers of both sides agree within `1e-6`
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericScorer;

impl NumericScorer {
    /// Compare an already-extracted reference with a predicted value
    pub fn score_values(expected: Option<f64>, predicted: Option<f64>) -> f64 {
        match (expected, predicted) {
            (Some(expected), Some(predicted)) if (expected - predicted).abs() <= TOLERANCE => 1.0,
            _ => 0.0,
        }
    }
}

#[async_trait]
impl Scorer for NumericScorer {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn expected_answer(&self, expected: &str) -> Answer {
        Answer::from_number(extract_number(expected))
    }

    async fn score(&self, expected: &str, predicted: &str) -> ScoreOutcome {
        let predicted = extract_number(predicted);
        let score = Self::score_values(extract_number(expected), predicted);
        ScoreOutcome::new(score, Answer::from_number(predicted))
    }
}
