//! Run untrusted solutions against their test harness
//!
//! The solution and the test are executed by a child interpreter in one
//! shared namespace, exactly as if both were `exec`'d into the same module.
//! The child is killed when the wall-clock budget runs out.

use std::process::Stdio;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use super::error_log::ErrorLog;
use super::fixtures::with_fixture;
use super::sanitize::sanitize;
use super::workspace::Workspace;
use crate::runner::SandboxConfig;

const PASS_SENTINEL: &str = "__FLOWBENCH_CHECK_PASSED__";

pub(crate) const TIMEOUT_MESSAGE: &str = "Execution timed out. Please check if your solution contains infinite loops or overly time-consuming operations.";

const DRIVER: &str = r#"import hashlib
import math
import re
import sys
from typing import Any, Dict, List, Optional, Tuple

ENTRY_POINT = sys.argv[1]
namespace = {
    "__name__": "__solution__",
    "math": math,
    "hashlib": hashlib,
    "re": re,
    "List": List,
    "Dict": Dict,
    "Tuple": Tuple,
    "Optional": Optional,
    "Any": Any,
}


def load(path):
    with open(path, encoding="utf-8") as source:
        exec(compile(source.read(), path, "exec"), namespace)


try:
    load("solution.py")
    if ENTRY_POINT not in namespace:
        raise ValueError(f"Function {ENTRY_POINT} is not defined in the solution.")
    load("test.py")
    if "check" not in namespace:
        raise ValueError("Test code does not define a check function.")
    namespace["check"](namespace[ENTRY_POINT])
except BaseException as e:
    sys.stderr.write(f"{type(e).__name__}: {e}")
    sys.stderr.flush()
    sys.exit(1)

print("__FLOWBENCH_CHECK_PASSED__")
"#;

/// Outcome of a code check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
}

/// Status plus a human-readable detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckResult {
    /// Create a passing result
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Pass,
            detail: detail.into(),
        }
    }

    /// Create a failing result
    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            detail: detail.into(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }

    /// 1 for a pass, 0 otherwise
    pub fn score(&self) -> f64 {
        if self.passed() { 1.0 } else { 0.0 }
    }
}

/// Executes solutions in a child interpreter with a hard timeout
#[derive(Debug, Clone)]
pub struct CodeRunner {
    config: SandboxConfig,
    error_log: Arc<ErrorLog>,
}

impl CodeRunner {
    pub fn new(config: SandboxConfig) -> Self {
        let error_log = Arc::new(ErrorLog::new(config.error_log.clone()));
        Self { config, error_log }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Check a solution against its test source.
    ///
    /// Never fails: every problem, including timeouts and a missing
    /// interpreter, is reported as [`CheckStatus::Fail`] and recorded in the
    /// error log.
    pub async fn run(&self, solution: &str, test: &str, entry_point: &str) -> CheckResult {
        let code = with_fixture(&sanitize(solution, entry_point), entry_point);

        match self.execute(&code, test, entry_point).await {
            Ok(()) => CheckResult::pass("Solution passed all tests."),
            Err(ExecError::Timeout) => {
                tracing::warn!(entry_point, timeout = ?self.config.timeout, "Code check timed out");
                self.error_log.append(TIMEOUT_MESSAGE).await;
                CheckResult::fail(TIMEOUT_MESSAGE)
            }
            Err(ExecError::Failed(error)) => {
                tracing::warn!(entry_point, error = %error, "Code check failed");
                let detail = format!("Error: {}\nSolution:\n{}\nTest:\n{}", error, code, test);
                self.error_log.append(&detail).await;
                CheckResult::fail(detail)
            }
        }
    }

    async fn execute(&self, code: &str, test: &str, entry_point: &str) -> Result<(), ExecError> {
        let workspace = Workspace::new().map_err(|e| ExecError::Failed(format!("{:#}", e)))?;
        for (name, content) in [("solution.py", code), ("test.py", test), ("driver.py", DRIVER)] {
            workspace
                .write_file(name, content)
                .await
                .map_err(|e| ExecError::Failed(format!("{:#}", e)))?;
        }

        let child = Command::new(&self.config.interpreter)
            .arg("driver.py")
            .arg(entry_point)
            .current_dir(workspace.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ExecError::Failed(format!(
                    "Failed to start interpreter {}: {}",
                    self.config.interpreter, e
                ))
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecError::Timeout)?
            .map_err(|e| ExecError::Failed(format!("Failed to collect output: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() && stdout.lines().any(|line| line.trim() == PASS_SENTINEL) {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        Err(ExecError::Failed(if stderr.is_empty() {
            format!("Interpreter exited with {}", output.status)
        } else {
            stderr.to_string()
        }))
    }
}

enum ExecError {
    Timeout,
    Failed(String),
}

#[cfg(test)]
pub(crate) fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const ADD_TEST: &str = "def check(candidate):\n    assert candidate(2, 3) == 5\n";

    fn runner(dir: &TempDir, timeout: Duration) -> CodeRunner {
        CodeRunner::new(SandboxConfig {
            timeout,
            error_log: dir.path().join("error.log"),
            ..Default::default()
        })
    }

    fn log_lines(dir: &TempDir) -> usize {
        std::fs::read_to_string(dir.path().join("error.log"))
            .map(|content| content.lines().filter(|l| l.get(19..22) == Some(" - ")).count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_passing_solution() {
        if !python_available() {
            eprintln!("python3 not available, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let result = runner(&dir, Duration::from_secs(15))
            .run("```python\ndef add(a, b):\n    return a + b\n\nprint(add(1, 1))\n```", ADD_TEST, "add")
            .await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.detail);
        assert!(!dir.path().join("error.log").exists());
    }

    #[tokio::test]
    async fn test_failing_assertion() {
        if !python_available() {
            eprintln!("python3 not available, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let result = runner(&dir, Duration::from_secs(15))
            .run("def add(a, b):\n    return a - b\n", ADD_TEST, "add")
            .await;
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.detail.contains("AssertionError"));
        assert!(result.detail.contains("def add(a, b)"));
        assert!(result.detail.contains("def check(candidate)"));
    }

    #[tokio::test]
    async fn test_missing_entry_point() {
        if !python_available() {
            eprintln!("python3 not available, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let result = runner(&dir, Duration::from_secs(15))
            .run("def plus(a, b):\n    return a + b\n", ADD_TEST, "add")
            .await;
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.detail.contains("Function add is not defined in the solution."));
    }

    #[tokio::test]
    async fn test_seeded_namespace_and_fixture() {
        if !python_available() {
            eprintln!("python3 not available, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let solution = "def decode_shift(s: str):\n    return \"\".join([chr(((ord(ch) - 5 - ord(\"a\")) % 26) + ord(\"a\")) for ch in s])\n";
        let test = "def check(candidate):\n    assert candidate(encode_shift('hello')) == 'hello'\n    assert math.sqrt(4) == 2\n";
        let result = runner(&dir, Duration::from_secs(15))
            .run(solution, test, "decode_shift")
            .await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.detail);
    }

    #[tokio::test]
    async fn test_infinite_loop_times_out() {
        if !python_available() {
            eprintln!("python3 not available, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let result = runner(&dir, Duration::from_millis(1500))
            .run("def add(a, b):\n    while True:\n        pass\n", ADD_TEST, "add")
            .await;
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.detail, TIMEOUT_MESSAGE);
        assert_eq!(log_lines(&dir), 1);
    }

    #[tokio::test]
    async fn test_missing_interpreter_fails() {
        let dir = TempDir::new().unwrap();
        let runner = CodeRunner::new(SandboxConfig {
            interpreter: "flowbench-no-such-interpreter".to_string(),
            error_log: dir.path().join("error.log"),
            ..Default::default()
        });
        let result = runner.run("def add(a, b):\n    return a + b\n", ADD_TEST, "add").await;
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.detail.contains("Failed to start interpreter"));
        assert_eq!(log_lines(&dir), 1);
    }

    #[test]
    fn test_check_result_score() {
        assert_eq!(CheckResult::pass("ok").score(), 1.0);
        assert_eq!(CheckResult::fail("no").score(), 0.0);
        assert_eq!(serde_json::to_string(&CheckStatus::Pass).unwrap(), "\"PASS\"");
    }
}
