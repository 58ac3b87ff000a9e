use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::{debug, info};

use crate::{file_id, registry::PathRegistry, sorted_entries};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestRecord {
    pub singer: String,
    pub song: String,
    pub uid: String,
    /// `{singer}/{song}`, relative to the dataset root.
    pub path: String,
}

/// Numeric-id split: `uid < train_below` goes to train, `uid < test_below` to test,
/// anything above is left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRule {
    pub train_below: u32,
    pub test_below: u32,
}

impl Default for SplitRule {
    fn default() -> Self {
        Self {
            train_below: 50,
            test_below: 60,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Manifests {
    pub train: Vec<ManifestRecord>,
    pub test: Vec<ManifestRecord>,
}

/// Build the train/test records for every `{singer}/{uid}.{ext}` file under `dataset_root`.
pub fn build_manifests(dataset_root: &Path, rule: &SplitRule) -> Result<Manifests> {
    let mut manifests = Manifests::default();

    for singer_dir in sorted_entries(dataset_root)? {
        if !singer_dir.is_dir() {
            continue;
        }
        let Some(singer) = singer_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let mut songs: Vec<(u32, ManifestRecord)> = Vec::new();
        for song_path in sorted_entries(&singer_dir)? {
            if !song_path.is_file() {
                continue;
            }
            let (Some(song), Some(uid)) = (
                song_path.file_name().and_then(|n| n.to_str()),
                file_id(&song_path),
            ) else {
                continue;
            };
            let Ok(number) = uid.parse::<u32>() else {
                debug!("Skipping {}: id is not numeric", song_path.display());
                continue;
            };

            songs.push((
                number,
                ManifestRecord {
                    singer: singer.to_string(),
                    song: song.to_string(),
                    uid: uid.to_string(),
                    path: format!("{singer}/{song}"),
                },
            ));
        }

        songs.sort_by_key(|(number, _)| *number);
        for (number, record) in songs {
            if number < rule.train_below {
                manifests.train.push(record);
            } else if number < rule.test_below {
                manifests.test.push(record);
            }
        }
    }

    Ok(manifests)
}

/// Write `records` as a 4-space indented UTF-8 JSON array.
pub fn write_json(path: &Path, records: &[ManifestRecord]) -> Result<()> {
    let out_file = File::create(path)
        .with_context(|| format!("Failed to create output: {}", path.display()))?;
    let mut writer = BufWriter::new(out_file);

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    records.serialize(&mut serializer)?;

    writer.flush()?;
    Ok(())
}

/// Build and write `train.json` / `test.json` for `dataset` under the registry's data path.
pub fn write_manifests(registry: &PathRegistry, dataset: &str, rule: &SplitRule) -> Result<Manifests> {
    let dataset_root = registry.dataset_root(dataset)?;
    let manifests = build_manifests(dataset_root, rule)?;

    let save_dir = registry.output_dir(dataset);
    std::fs::create_dir_all(&save_dir)
        .with_context(|| format!("Failed to create {}", save_dir.display()))?;

    write_json(&save_dir.join("train.json"), &manifests.train)?;
    write_json(&save_dir.join("test.json"), &manifests.test)?;

    info!("Wrote: {}", save_dir.display());
    info!("Train: {}", manifests.train.len());
    info!("Test: {}", manifests.test.len());
    Ok(manifests)
}
