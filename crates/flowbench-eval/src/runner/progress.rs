//! Progress reporting during a run

use crate::benchmarks::DatasetKind;

/// Callback for progress updates during a run
pub type ProgressCallback = Box<dyn Fn(EvalProgress) + Send + Sync>;

/// Progress update after an item completes
#[derive(Debug, Clone, PartialEq)]
pub struct EvalProgress {
    /// Dataset being evaluated
    pub dataset: DatasetKind,
    /// Items finished so far, including this one
    pub completed: usize,
    /// Total number of items in the run
    pub total: usize,
    /// Score of the item that just finished
    pub score: f64,
}

impl EvalProgress {
    /// Completed fraction in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let progress = EvalProgress {
            dataset: DatasetKind::Gsm8k,
            completed: 1,
            total: 4,
            score: 1.0,
        };
        assert_eq!(progress.fraction(), 0.25);
        assert_eq!(
            EvalProgress {
                total: 0,
                completed: 0,
                ..progress
            }
            .fraction(),
            1.0
        );
    }
}
