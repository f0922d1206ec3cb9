//! Benchmark run infrastructure
//!
//! Configuration, the concurrency gate, the retry/timeout executor and the
//! driver that ties them together.

mod config;
mod driver;
mod gate;
mod progress;
mod retry;

pub use config::{BenchConfig, FamilyProfile, SandboxConfig};
pub use driver::{BenchmarkDriver, MISMATCH_LOG_FILE, RunOutcome};
pub use gate::{ConcurrencyGate, GatePermit};
pub use progress::{EvalProgress, ProgressCallback};
pub use retry::{AttemptOutcome, call_with_retry};
