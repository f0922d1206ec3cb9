//! Equality of competition-math answers
//!
//! Tries, in order: plain string equality, numeric equality (with optional
//! percentage scaling), bracketed tuples, matrices, equations, and finally
//! symbolic equivalence under a wall-clock budget.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::expr::{self, Budget};

const NUMERIC_TOLERANCE: f64 = 1e-3;

const MATRIX_ENVIRONMENTS: [&str; 2] = ["pmatrix", "bmatrix"];

/// Settings for comparing math answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathEquality {
    /// Also accept the reference scaled by 100 or 1/100
    #[serde(default = "default_true")]
    pub include_percentage: bool,

    /// Compare numbers with an absolute tolerance of `1e-3` instead of exactly
    #[serde(default = "default_true")]
    pub is_close: bool,

    /// Wall-clock budget for each symbolic check
    #[serde(default = "default_symbolic_timeout", with = "humantime_serde")]
    pub symbolic_timeout: Duration,
}

fn default_true() -> bool {
    true
}

fn default_symbolic_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for MathEquality {
    fn default() -> Self {
        Self {
            include_percentage: true,
            is_close: true,
            symbolic_timeout: default_symbolic_timeout(),
        }
    }
}

/// Parse a plain number, accepting thousands separators and a trailing `%`
pub fn parse_digits(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    let cleaned = cleaned.trim();
    if let Ok(value) = cleaned.parse::<f64>() {
        return Some(value);
    }
    let stripped = cleaned.strip_suffix('%')?;
    let stripped = stripped.strip_suffix('\\').unwrap_or(stripped);
    stripped.trim().parse::<f64>().ok().map(|value| value / 100.0)
}

impl MathEquality {
    /// Disable percentage scaling
    pub fn without_percentage(mut self) -> Self {
        self.include_percentage = false;
        self
    }

    /// Set the symbolic budget
    pub fn with_symbolic_timeout(mut self, timeout: Duration) -> Self {
        self.symbolic_timeout = timeout;
        self
    }

    /// Whether a predicted answer matches the reference
    pub fn math_equal(&self, prediction: &str, reference: &str) -> bool {
        let prediction = prediction.trim();
        let reference = reference.trim();

        if prediction == reference {
            return true;
        }

        if let (Some(predicted), Some(expected)) = (parse_digits(prediction), parse_digits(reference))
        {
            return self.numbers_equal(predicted, expected);
        }

        if prediction.is_empty() {
            return false;
        }

        self.brackets_equal(prediction, reference)
            || self.matrices_equal(prediction, reference)
            || self.equations_equal(prediction, reference)
            || self.symbolic_equal(prediction, reference)
    }

    fn numbers_equal(&self, predicted: f64, expected: f64) -> bool {
        let candidates: &[f64] = if self.include_percentage {
            &[expected / 100.0, expected, expected * 100.0]
        } else {
            &[expected]
        };
        candidates.iter().any(|candidate| {
            if self.is_close {
                *candidate == predicted || (candidate - predicted).abs() <= NUMERIC_TOLERANCE
            } else {
                *candidate == predicted
            }
        })
    }

    fn brackets_equal(&self, prediction: &str, reference: &str) -> bool {
        let is_list = |s: &str| s.starts_with('[') && s.ends_with(']');
        let is_tuple = |s: &str| s.starts_with('(') && s.ends_with(')');

        let (mut pred_str, mut ref_str) = (prediction.to_string(), reference.to_string());
        if (is_list(prediction) && !reference.starts_with('('))
            || (is_tuple(prediction) && !reference.starts_with('['))
        {
            let brackets: &[char] = &['[', ']', '(', ')'];
            pred_str = pred_str.trim_matches(brackets).to_string();
            ref_str = ref_str.trim_matches(brackets).to_string();
        }
        let strip = |s: &str| s.replace(['{', '}', '(', ')'], "");
        if strip(&pred_str) == strip(&ref_str) {
            return true;
        }

        let same_shape = (is_list(prediction) && is_list(reference))
            || (is_tuple(prediction) && is_tuple(reference));
        if !same_shape {
            return false;
        }

        let pred_parts: Vec<&str> = prediction[1..prediction.len() - 1].split(',').collect();
        let ref_parts: Vec<&str> = reference[1..reference.len() - 1].split(',').collect();
        pred_parts.len() == ref_parts.len()
            && pred_parts
                .iter()
                .zip(&ref_parts)
                .all(|(p, r)| self.math_equal(p, r))
    }

    fn matrices_equal(&self, prediction: &str, reference: &str) -> bool {
        let (Some(pred_rows), Some(ref_rows)) = (matrix_rows(prediction), matrix_rows(reference))
        else {
            return false;
        };
        if pred_rows.len() != ref_rows.len() {
            return false;
        }

        pred_rows.iter().zip(&ref_rows).all(|(pred_row, ref_row)| {
            let pred_cells: Vec<&str> = pred_row.split('&').collect();
            let ref_cells: Vec<&str> = ref_row.split('&').collect();
            pred_cells.len() == ref_cells.len()
                && pred_cells
                    .iter()
                    .zip(&ref_cells)
                    .all(|(p, r)| self.math_equal(p, r))
        })
    }

    fn equations_equal(&self, prediction: &str, reference: &str) -> bool {
        let pred_eqs = prediction.matches('=').count();
        let ref_eqs = reference.matches('=').count();

        if pred_eqs == 1 && ref_eqs == 1 {
            let pred = as_difference(prediction);
            let reference = as_difference(reference);
            return self.symbolic_equal(&pred, &reference)
                || self.symbolic_equal(&format!("-({})", pred), &reference);
        }

        if pred_eqs == 1 && ref_eqs == 0 {
            if let Some((lhs, rhs)) = prediction.split_once('=') {
                if lhs.trim().chars().count() <= 2 {
                    return self.math_equal(rhs, reference);
                }
            }
        } else if ref_eqs == 1 && pred_eqs == 0 {
            if let Some((lhs, rhs)) = reference.split_once('=') {
                if lhs.trim().chars().count() <= 2 {
                    return self.math_equal(prediction, rhs);
                }
            }
        }
        false
    }

    /// Symbolic equivalence under the configured budget
    pub fn symbolic_equal(&self, a: &str, b: &str) -> bool {
        let budget = Budget::new(self.symbolic_timeout);
        let equal = match (expr::parse(a, &budget), expr::parse(b, &budget)) {
            (Some(lhs), Some(rhs)) => expr::equivalent(&lhs, &rhs, &budget),
            _ => false,
        };
        if !equal && budget.exhausted() {
            tracing::debug!(
                lhs = a,
                rhs = b,
                timeout = ?self.symbolic_timeout,
                "Symbolic comparison ran out of time"
            );
        }
        equal
    }
}

fn as_difference(equation: &str) -> String {
    match equation.split_once('=') {
        Some((lhs, rhs)) => format!("{} - ({})", lhs.trim(), rhs.trim()),
        None => equation.to_string(),
    }
}

fn matrix_rows(text: &str) -> Option<Vec<&str>> {
    MATRIX_ENVIRONMENTS.iter().find_map(|env| {
        let begin = format!("\\begin{{{}}}", env);
        let end = format!("\\end{{{}}}", env);
        let body = text.strip_prefix(begin.as_str())?.strip_suffix(end.as_str())?;
        Some(
            body.split("\\\\")
                .map(str::trim)
                .filter(|row| !row.is_empty())
                .collect(),
        )
    })
}
