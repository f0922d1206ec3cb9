//! Sandboxed execution of generated code
//!
//! Solutions are reduced to what the entry point needs, completed with any
//! helper the test expects, and run against the test's `check` function in a
//! child interpreter under a hard timeout.

mod error_log;
mod fixtures;
mod runner;
mod sanitize;
mod workspace;

pub use error_log::ErrorLog;
pub use fixtures::{fixture_for, with_fixture};
pub use runner::{CheckResult, CheckStatus, CodeRunner};
pub use sanitize::{extract_code, sanitize};
pub use workspace::Workspace;

#[cfg(test)]
pub(crate) use runner::python_available;
