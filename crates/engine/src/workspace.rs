//! Workspace directory layout.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Standard on-disk layout rooted at a base directory: flow documents under
/// `flows/`, per-run logs under `logs/`, persisted state under `data/`.
#[derive(Debug, Clone)]
pub struct WorkspaceDirs {
    /// Base directory.
    pub root: PathBuf,
    /// Flow documents.
    pub flows: PathBuf,
    /// Per-run log files.
    pub logs: PathBuf,
    /// Persisted state such as trigger records.
    pub data: PathBuf,
}

impl WorkspaceDirs {
    /// Resolves the layout under `base` and creates any missing directory.
    pub fn ensure(base: impl AsRef<Path>) -> Result<Self> {
        let root = base.as_ref().to_path_buf();
        let dirs = Self {
            flows: root.join("flows"),
            logs: root.join("logs"),
            data: root.join("data"),
            root,
        };
        for dir in [&dirs.root, &dirs.flows, &dirs.logs, &dirs.data] {
            fs::create_dir_all(dir).with_context(|| format!("failed to create workspace directory {}", dir.display()))?;
        }
        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_creates_the_full_layout() {
        let base = tempfile::tempdir().expect("tempdir");
        let dirs = WorkspaceDirs::ensure(base.path().join("workspace")).expect("ensure");
        assert!(dirs.flows.is_dir());
        assert!(dirs.logs.is_dir());
        assert!(dirs.data.is_dir());
    }

    #[test]
    fn ensure_is_idempotent() {
        let base = tempfile::tempdir().expect("tempdir");
        WorkspaceDirs::ensure(base.path()).expect("first");
        WorkspaceDirs::ensure(base.path()).expect("second");
    }
}
