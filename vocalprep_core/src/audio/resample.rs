use anyhow::{Context, Result};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};
use tracing::info;

use super::AudioBuffer;

/// Resample every channel of `buffer` to `target_rate`.
///
/// Returns a copy unchanged when the rate already matches.
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    let source_rate = buffer.sample_rate();
    if source_rate == target_rate || buffer.is_empty() {
        return Ok(AudioBuffer::new(buffer.samples().to_owned(), target_rate));
    }

    info!("Resampling from {}Hz to {}Hz", source_rate, target_rate);

    let channels = buffer.channels();

    // For offline processing, 1024 is a fine starting point.
    let chunk_size: usize = 1024;
    let sub_chunks: usize = 1;

    let mut resampler = Fft::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        chunk_size,
        sub_chunks,
        channels,
        FixedSync::Input,
    )
    .context("failed to construct FFT resampler")?;

    let input = buffer.to_interleaved();
    let input_len_frames = buffer.len();
    let out_len_frames = resampler.process_all_needed_output_len(input_len_frames);

    let mut out = vec![0.0f32; out_len_frames * channels];

    let input_adapter = InterleavedSlice::new(&input, channels, input_len_frames)
        .context("bad input adapter")?;
    let mut output_adapter = InterleavedSlice::new_mut(&mut out, channels, out_len_frames)
        .context("bad output adapter")?;

    let (_frames_read, frames_written) = resampler.process_all_into_buffer(
        &input_adapter,
        &mut output_adapter,
        input_len_frames,
        None,
    )?;

    out.truncate(frames_written * channels);
    AudioBuffer::from_interleaved(&out, channels, target_rate)
}
