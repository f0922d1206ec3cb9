//! Scratch directory for one code check
//!
//! Each check gets its own temporary directory holding the solution, the
//! test source and the driver script; it is removed when dropped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tokio::fs;

/// Temporary working directory for a sandboxed check
pub struct Workspace {
    /// Owned temporary directory (cleaned up on drop)
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace in the system temp directory
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("flowbench-check-")
            .tempdir()
            .context("Failed to create temporary directory")?;
        Ok(Self { temp_dir })
    }

    /// Get the root path of the workspace
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file relative to the workspace root
    pub async fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let full_path = self.root().join(name);
        fs::write(&full_path, content)
            .await
            .with_context(|| format!("Failed to write file: {:?}", full_path))?;

        tracing::trace!("Created file: {:?}", full_path);
        Ok(full_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workspace_write_file() {
        let workspace = Workspace::new().unwrap();
        assert!(workspace.root().exists());

        let path = workspace.write_file("solution.py", "x = 1\n").await.unwrap();
        assert_eq!(path, workspace.root().join("solution.py"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "x = 1\n");
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let workspace = Workspace::new().unwrap();
        let root = workspace.root().to_path_buf();
        drop(workspace);
        assert!(!root.exists());
    }
}
