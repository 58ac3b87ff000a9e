pub mod collect;
pub mod manifest;
pub mod registry;
pub mod segment;
pub mod stats;

pub use registry::PathRegistry;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Immediate children of `dir`, sorted by file name.
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;
    entries.sort();
    Ok(entries)
}

/// Everything before the first `.` of the file name, e.g. `"12"` for `12.wav`.
pub(crate) fn file_id(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()?.split('.').next()
}
