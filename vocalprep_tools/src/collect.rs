use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::sorted_entries;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectReport {
    pub copied: usize,
    pub skipped_non_wav: usize,
}

/// Copy every `.wav` under `source` into the flat directory `target`.
///
/// Each copy is named `{parent_dir}_{file_name}` so that identically named takes from
/// different folders do not collide. Existing files in `target` are overwritten.
pub fn collect_wavs(source: &Path, target: &Path) -> Result<CollectReport> {
    std::fs::create_dir_all(target)
        .with_context(|| format!("Failed to create target directory: {}", target.display()))?;
    let target_canonical = target
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", target.display()))?;

    let mut report = CollectReport::default();
    let mut pending: Vec<PathBuf> = vec![source.to_path_buf()];

    while let Some(dir) = pending.pop() {
        if dir.canonicalize().ok().as_deref() == Some(target_canonical.as_path()) {
            debug!("Skipping collection directory {}", dir.display());
            continue;
        }

        let folder_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut subdirs = Vec::new();
        for path in sorted_entries(&dir)? {
            if path.is_dir() {
                subdirs.push(path);
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                report.skipped_non_wav += 1;
                continue;
            };
            if !file_name.ends_with(".wav") {
                report.skipped_non_wav += 1;
                continue;
            }

            let destination = target.join(format!("{folder_name}_{file_name}"));
            std::fs::copy(&path, &destination).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    path.display(),
                    destination.display()
                )
            })?;
            report.copied += 1;
        }

        // Reverse so the stack visits subdirectories in sorted order.
        pending.extend(subdirs.into_iter().rev());
    }

    info!(
        "Collected {} wav files from {} into {}",
        report.copied,
        source.display(),
        target.display()
    );
    Ok(report)
}
