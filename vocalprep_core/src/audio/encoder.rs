use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

use super::AudioBuffer;

/// Sample encoding used when writing chunks to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WavFormat {
    /// 32-bit IEEE float, lossless for decoded f32 PCM.
    #[default]
    Float32,
    /// 16-bit signed integer PCM, samples clamped to [-1, 1].
    Pcm16,
}

impl WavFormat {
    fn spec(self, buffer: &AudioBuffer) -> WavSpec {
        let (bits_per_sample, sample_format) = match self {
            WavFormat::Float32 => (32, SampleFormat::Float),
            WavFormat::Pcm16 => (16, SampleFormat::Int),
        };
        WavSpec {
            channels: buffer.channels() as u16,
            sample_rate: buffer.sample_rate(),
            bits_per_sample,
            sample_format,
        }
    }
}

/// Write `buffer` as a WAV file, interleaving channels in their original order.
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &AudioBuffer, format: WavFormat) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WavWriter::create(path, format.spec(buffer))
        .with_context(|| format!("failed to create WAV file: {}", path.display()))?;

    let samples = buffer.samples();
    for frame in samples.columns() {
        for &sample in frame.iter() {
            match format {
                WavFormat::Float32 => writer.write_sample(sample)?,
                WavFormat::Pcm16 => {
                    let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
                    writer.write_sample(scaled)?
                }
            }
        }
    }

    writer
        .finalize()
        .with_context(|| format!("failed to finalize WAV file: {}", path.display()))?;
    Ok(())
}
