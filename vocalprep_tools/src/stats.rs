use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use vocalprep_core::audio::probe_duration;

use crate::{registry::PathRegistry, segment::is_audio_file, sorted_entries};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingerStats {
    pub singer: String,
    pub songs: usize,
    pub total_seconds: f64,
    pub mean_seconds: f64,
}

/// Song count and durations for every singer directory of a dataset.
pub fn singer_statistics(dataset_root: &Path) -> Result<Vec<SingerStats>> {
    let mut stats = Vec::new();

    for singer_dir in sorted_entries(dataset_root)? {
        if !singer_dir.is_dir() {
            continue;
        }
        let singer = singer_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut songs = 0usize;
        let mut total_seconds = 0.0f64;
        for song in sorted_entries(&singer_dir)? {
            if !is_audio_file(&song) {
                continue;
            }
            total_seconds += probe_duration(&song)?;
            songs += 1;
        }

        let mean_seconds = if songs == 0 {
            0.0
        } else {
            total_seconds / songs as f64
        };
        stats.push(SingerStats {
            singer,
            songs,
            total_seconds,
            mean_seconds,
        });
    }

    Ok(stats)
}

/// Compute statistics for `dataset` and write them to `statistics.csv` in its output directory.
pub fn write_statistics(registry: &PathRegistry, dataset: &str) -> Result<PathBuf> {
    let stats = singer_statistics(registry.dataset_root(dataset)?)?;

    let save_dir = registry.output_dir(dataset);
    std::fs::create_dir_all(&save_dir)
        .with_context(|| format!("Failed to create {}", save_dir.display()))?;
    let out_path = save_dir.join("statistics.csv");

    let mut writer = csv::Writer::from_path(&out_path)
        .with_context(|| format!("Failed to create output: {}", out_path.display()))?;
    for row in &stats {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let total: f64 = stats.iter().map(|s| s.total_seconds).sum();
    info!(
        "Wrote statistics for {} singers ({:.1} h) to {}",
        stats.len(),
        total / 3600.0,
        out_path.display()
    );
    Ok(out_path)
}
