// src/fsutil.rs

//! Filesystem helpers shared by the fetcher and the orchestrator

use crate::error::{Error, Result};
use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

/// Directory mode for everything the engine creates
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Create a directory (and missing ancestors) with mode 0755.
///
/// Succeeds if `path` already exists and is a directory. Fails with
/// [`Error::NotADirectory`] if it exists as anything else. Failures while
/// creating ancestors propagate unchanged.
pub fn ensure_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) => {
            if meta.is_dir() {
                Ok(())
            } else {
                Err(Error::NotADirectory(path.to_path_buf()))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::DirBuilder::new()
                .recursive(true)
                .mode(DEFAULT_DIR_MODE)
                .create(path)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
