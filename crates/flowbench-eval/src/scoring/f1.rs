//! Token-level F1 for reading-comprehension answers

use std::collections::HashMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Answer, ScoreOutcome, Scorer};

static ARTICLES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(a|an|the)\b").expect("article pattern is valid"));

/// Normalize an answer: lowercase, strip ASCII punctuation, drop the articles
/// `a`/`an`/`the`, collapse whitespace.
pub fn normalize_answer(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_punct: String = lowered
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    let without_articles = ARTICLES.replace_all(&without_punct, " ");
    without_articles.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Token-multiset F1 between a reference and a prediction after normalization
pub fn f1_score(reference: &str, prediction: &str) -> f64 {
    let reference = normalize_answer(reference);
    let prediction = normalize_answer(prediction);
    let ref_tokens: Vec<&str> = reference.split_whitespace().collect();
    let pred_tokens: Vec<&str> = prediction.split_whitespace().collect();

    let mut ref_counts: HashMap<&str, usize> = HashMap::new();
    for token in &ref_tokens {
        *ref_counts.entry(token).or_insert(0) += 1;
    }
    let mut pred_counts: HashMap<&str, usize> = HashMap::new();
    for token in &pred_tokens {
        *pred_counts.entry(token).or_insert(0) += 1;
    }

    let num_same: usize = pred_counts
        .iter()
        .map(|(token, count)| (*count).min(ref_counts.get(token).copied().unwrap_or(0)))
        .sum();

    if num_same == 0 {
        return 0.0;
    }

    let precision = num_same as f64 / pred_tokens.len() as f64;
    let recall = num_same as f64 / ref_tokens.len() as f64;
    2.0 * precision * recall / (precision + recall)
}

/// Plain span F1 (HotpotQA)
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanF1Scorer;

#[async_trait]
impl Scorer for SpanF1Scorer {
    fn name(&self) -> &'static str {
        "span_f1"
    }

    async fn score(&self, expected: &str, predicted: &str) -> ScoreOutcome {
        ScoreOutcome::new(f1_score(expected, predicted), Answer::from(predicted))
    }
}

/// Span F1 maximized over `|`-delimited alternatives on both sides (DROP)
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeMaxF1Scorer;

impl PipeMaxF1Scorer {
    /// Best F1 over every (reference part, prediction part) pair.
    ///
    /// Empty reference parts are skipped; with no usable reference part the
    /// score is 0.
    pub fn max_f1(expected: &str, predicted: &str) -> f64 {
        expected
            .split('|')
            .filter(|answer| !answer.trim().is_empty())
            .flat_map(|answer| {
                predicted
                    .split('|')
                    .map(move |part| f1_score(answer, part))
            })
            .fold(0.0, f64::max)
    }
}

#[async_trait]
impl Scorer for PipeMaxF1Scorer {
    fn name(&self) -> &'static str {
        "pipe_max_f1"
    }

    async fn score(&self, expected: &str, predicted: &str) -> ScoreOutcome {
        ScoreOutcome::new(Self::max_f1(expected, predicted), Answer::from(predicted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_answer() {
        assert_eq!(normalize_answer("The  Cat, a dog!"), "cat dog");
        assert_eq!(normalize_answer("An apple"), "apple");
        assert_eq!(normalize_answer("theater"), "theater");
        assert_eq!(normalize_answer("  "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for text in [
            "The Barack Obama, a president.",
            "t-he a-n cat",
            "A  B\tC\nthe",
            "Ünïcode THE Words",
        ] {
            let once = normalize_answer(text);
            assert_eq!(normalize_answer(&once), once, "input: {text:?}");
        }
    }

    #[test]
    fn test_f1_partial_overlap() {
        let score = f1_score("Barack Obama", "barack hussein obama");
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_f1_no_overlap_and_empty() {
        assert_eq!(f1_score("Paris", "London"), 0.0);
        assert_eq!(f1_score("", ""), 0.0);
        assert_eq!(f1_score("the", "a"), 0.0);
    }

    #[test]
    fn test_f1_respects_multiplicity() {
        // pred has "new" twice but the reference only once
        let score = f1_score("new york", "new new york");
        let precision = 2.0 / 3.0;
        let recall = 1.0;
        let expected = 2.0 * precision * recall / (precision + recall);
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_pipe_max_f1() {
        let score = PipeMaxF1Scorer::max_f1("New York|NYC", "The city is NYC");
        assert!((score - 0.5).abs() < 1e-9);

        let score = PipeMaxF1Scorer::max_f1("4", "3|4");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_pipe_max_f1_empty_references() {
        assert_eq!(PipeMaxF1Scorer::max_f1("|  |", "anything"), 0.0);
        assert_eq!(PipeMaxF1Scorer::max_f1("", "anything"), 0.0);
    }

    #[tokio::test]
    async fn test_span_scorer_extracts_prediction() {
        let outcome = SpanF1Scorer.score("Barack Obama", "barack hussein obama").await;
        assert!((outcome.score - 0.8).abs() < 1e-9);
        assert_eq!(outcome.extracted, Answer::from("barack hussein obama"));
    }
}
