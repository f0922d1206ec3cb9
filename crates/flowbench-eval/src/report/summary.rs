//! Aggregate statistics of a run

use std::fmt;

use serde::{Deserialize, Serialize};

use super::EvaluationRow;

/// How row costs combine into the run total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostAggregation {
    /// Costs are the provider's running total; the run total is the maximum
    #[default]
    Cumulative,
    /// Costs are per call; the run total is the sum
    PerItem,
}

/// Average score and cost figures for one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub avg_score: f64,
    pub total_cost: f64,
    /// `total_cost / rows`
    pub avg_cost: f64,
    pub rows: usize,
}

impl RunSummary {
    /// Summarize rows; an empty run is all zeros
    pub fn from_rows(rows: &[EvaluationRow], aggregation: CostAggregation) -> Self {
        if rows.is_empty() {
            return Self {
                avg_score: 0.0,
                total_cost: 0.0,
                avg_cost: 0.0,
                rows: 0,
            };
        }

        let n = rows.len() as f64;
        let avg_score = rows.iter().map(|row| row.score).sum::<f64>() / n;
        let total_cost = match aggregation {
            CostAggregation::Cumulative => rows.iter().map(|row| row.cost).fold(0.0, f64::max),
            CostAggregation::PerItem => rows.iter().map(|row| row.cost).sum(),
        };

        Self {
            avg_score,
            total_cost,
            avg_cost: total_cost / n,
            rows: rows.len(),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Average score: {:.5} | Total cost: {:.5} | Avg cost per item: {:.5} | Items: {}",
            self.avg_score, self.total_cost, self.avg_cost, self.rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Answer;

    fn row(score: f64, cost: f64) -> EvaluationRow {
        EvaluationRow {
            inputs: "q".to_string(),
            context: None,
            prediction: "p".to_string(),
            expected_output: Answer::Missing,
            score,
            cost,
        }
    }

    #[test]
    fn test_cumulative_cost_uses_max() {
        let rows = [row(1.0, 0.01), row(0.0, 0.03), row(0.5, 0.02)];
        let summary = RunSummary::from_rows(&rows, CostAggregation::Cumulative);
        assert!((summary.avg_score - 0.5).abs() < 1e-12);
        assert_eq!(summary.total_cost, 0.03);
        assert!((summary.avg_cost - 0.01).abs() < 1e-12);
        assert_eq!(summary.rows, 3);
    }

    #[test]
    fn test_per_item_cost_sums() {
        let rows = [row(1.0, 0.01), row(1.0, 0.03)];
        let summary = RunSummary::from_rows(&rows, CostAggregation::PerItem);
        assert!((summary.total_cost - 0.04).abs() < 1e-12);
        assert!((summary.avg_cost - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_empty_run() {
        let summary = RunSummary::from_rows(&[], CostAggregation::Cumulative);
        assert_eq!(summary.avg_score, 0.0);
        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.avg_cost, 0.0);
    }
}
