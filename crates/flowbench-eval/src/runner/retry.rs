//! Retry and timeout around a single workflow call

use std::time::Duration;

use tokio::time::timeout;

use super::FamilyProfile;
use crate::workflow::{Prediction, Workflow, WorkflowInput};

/// How the attempts for one item ended
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The workflow returned a prediction
    Completed { prediction: Prediction, attempts: u32 },
    /// Every attempt raised; holds the last error
    Exhausted { error: String, attempts: u32 },
    /// A call exceeded the per-call timeout
    TimedOut { timeout: Duration, attempts: u32 },
}

impl AttemptOutcome {
    /// Number of workflow invocations made
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Completed { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::TimedOut { attempts, .. } => *attempts,
        }
    }

    /// Text stored as the prediction when the workflow produced none
    pub fn error_text(&self) -> Option<String> {
        match self {
            Self::Completed { .. } => None,
            Self::Exhausted { error, .. } => Some(error.clone()),
            Self::TimedOut { timeout, .. } => Some(format!(
                "Timeout error: workflow did not finish within {:?}",
                timeout
            )),
        }
    }
}

/// Invoke the workflow, retrying errors up to the profile's attempt budget.
///
/// A timed-out call ends the item immediately. Between failed attempts the
/// executor waits `retry_delay`.
pub async fn call_with_retry(
    workflow: &dyn Workflow,
    input: &WorkflowInput,
    profile: &FamilyProfile,
) -> AttemptOutcome {
    let max_attempts = profile.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        let call = workflow.call(input.clone());
        let result = match profile.call_timeout {
            Some(limit) => match timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(attempt, timeout = ?limit, "Workflow call timed out");
                    return AttemptOutcome::TimedOut {
                        timeout: limit,
                        attempts: attempt,
                    };
                }
            },
            None => call.await,
        };

        match result {
            Ok(prediction) => {
                return AttemptOutcome::Completed {
                    prediction,
                    attempts: attempt,
                };
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    error = %e,
                    "Workflow call failed"
                );
                last_error = format!("{:#}", e);
                if attempt < max_attempts && !profile.retry_delay.is_zero() {
                    tokio::time::sleep(profile.retry_delay).await;
                }
            }
        }
    }

    AttemptOutcome::Exhausted {
        error: last_error,
        attempts: max_attempts,
    }
}
