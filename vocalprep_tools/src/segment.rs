use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use vocalprep_core::{
    audio::{decode_file, resample, write_wav},
    Slicer, SlicerConfig, WavFormat,
};

use crate::{file_id, registry::PathRegistry, sorted_entries};

/// Extensions picked up from a singer directory.
pub const AUDIO_EXTENSIONS: [&str; 4] = ["wav", "flac", "mp3", "ogg"];

/// Subdirectory of the singer directory that receives the chunks.
pub const SEGMENTS_DIR: &str = "segments";

#[derive(Debug, Clone, PartialEq)]
pub struct SliceOptions {
    pub dataset: String,
    pub singer: String,
    pub slicer: SlicerConfig,
    /// Resample before slicing; `None` keeps each file's native rate.
    pub sample_rate: Option<u32>,
    pub format: WavFormat,
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self {
            dataset: "ProSinger".to_string(),
            singer: "李健".to_string(),
            slicer: SlicerConfig::default(),
            sample_rate: None,
            format: WavFormat::default(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SliceReport {
    pub files: usize,
    pub chunks: usize,
    pub output_dir: PathBuf,
}

pub fn is_audio_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
}

/// Slice every recording of one singer into `{song_id}_{index}.wav` chunks.
///
/// The slicer configuration is checked before any file is read. Files are processed in
/// parallel and the first failure aborts the job.
pub fn slice_singer(registry: &PathRegistry, options: &SliceOptions) -> Result<SliceReport> {
    options.slicer.validate()?;

    let singer_dir = registry.dataset_root(&options.dataset)?.join(&options.singer);
    let save_dir = singer_dir.join(SEGMENTS_DIR);

    let songs: Vec<PathBuf> = sorted_entries(&singer_dir)?
        .into_iter()
        .filter(|p| is_audio_file(p))
        .collect();

    check_unique_ids(&songs)?;

    std::fs::create_dir_all(&save_dir)
        .with_context(|| format!("Failed to create output directory: {}", save_dir.display()))?;

    info!(
        "Slicing {} recordings of {} into {}",
        songs.len(),
        options.singer,
        save_dir.display()
    );

    let chunk_counts = songs
        .par_iter()
        .map(|song| slice_file(song, &save_dir, options))
        .collect::<Result<Vec<usize>>>()?;

    let report = SliceReport {
        files: songs.len(),
        chunks: chunk_counts.iter().sum(),
        output_dir: save_dir,
    };
    info!("Wrote {} chunks from {} files", report.chunks, report.files);
    Ok(report)
}

/// Chunk names derive from the file id, so two recordings sharing an id would overwrite
/// each other's output.
fn check_unique_ids(songs: &[PathBuf]) -> Result<()> {
    let mut seen: BTreeMap<&str, &Path> = BTreeMap::new();
    for song in songs {
        let id = file_id(song).with_context(|| format!("Invalid file name: {}", song.display()))?;
        if let Some(previous) = seen.insert(id, song) {
            bail!(
                "{} and {} share the id '{}' and would write the same chunk files",
                previous.display(),
                song.display(),
                id
            );
        }
    }
    Ok(())
}

/// Slice one file into `save_dir`, returning the number of chunks written.
pub fn slice_file(path: &Path, save_dir: &Path, options: &SliceOptions) -> Result<usize> {
    let song_id = file_id(path)
        .with_context(|| format!("Invalid file name: {}", path.display()))?
        .to_string();

    let mut audio = decode_file(path)?;
    if let Some(rate) = options.sample_rate {
        audio = resample(&audio, rate)
            .with_context(|| format!("Failed to resample {}", path.display()))?;
    }

    let slicer = Slicer::new(audio.sample_rate(), &options.slicer)?;
    let chunks = slicer.slice(&audio);

    for (i, chunk) in chunks.iter().enumerate() {
        let out_path = save_dir.join(format!("{song_id}_{i}.wav"));
        write_wav(&out_path, chunk, options.format)?;
    }

    debug!(
        "{}: {:.2}s into {} chunks",
        path.display(),
        audio.duration_secs(),
        chunks.len()
    );
    Ok(chunks.len())
}
