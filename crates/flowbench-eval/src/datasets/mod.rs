//! Dataset loading
//!
//! Datasets are JSON-Lines files, one record per line.

mod loader;

pub use loader::{Dataset, DatasetLoader, Record, Split};
