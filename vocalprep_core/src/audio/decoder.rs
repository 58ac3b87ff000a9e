use anyhow::{anyhow, Context, Result};
use std::{fs::File, path::Path};
use tracing::debug;

use symphonia::core::{
    audio::SampleBuffer,
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::{FormatOptions, FormatReader},
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use super::AudioBuffer;

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Hint from extension (optional but helps).
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("unsupported format or failed to probe {}", path.display()))?;

    Ok(probed.format)
}

/// Decode an audio file at its native sampling rate, keeping every channel.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let mut format = open_format(path)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| anyhow!("no supported audio tracks found in {}", path.display()))?;

    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("failed to create decoder for selected track")?;

    let mut interleaved_f32: Vec<f32> = Vec::new();

    // Prefer codec params, fall back to the first decoded buffer's spec.
    let mut sample_rate: Option<u32> = track.codec_params.sample_rate;
    let mut channels: Option<usize> = track.codec_params.channels.map(|c| c.count());

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::ResetRequired) => {
                return Err(anyhow!(
                    "decoder reset required (chained streams) in {}",
                    path.display()
                ));
            }
            Err(SymphoniaError::IoError(_)) => break, // end of file
            Err(e) => return Err(e).context("error reading next packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::IoError(_)) => continue,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::ResetRequired) => {
                return Err(anyhow!(
                    "decoder reset required mid-stream in {}",
                    path.display()
                ));
            }
            Err(e) => return Err(e).context("unrecoverable decode error"),
        };

        sample_rate.get_or_insert(decoded.spec().rate);
        channels.get_or_insert(decoded.spec().channels.count());

        let mut sbuf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        sbuf.copy_interleaved_ref(decoded);

        interleaved_f32.extend_from_slice(sbuf.samples());
    }

    let sample_rate = sample_rate.ok_or_else(|| anyhow!("could not determine input sample rate"))?;
    let channels = channels.ok_or_else(|| anyhow!("could not determine channel count"))?;

    if interleaved_f32.is_empty() {
        return Err(anyhow!("decoded audio was empty: {}", path.display()));
    }

    let buffer = AudioBuffer::from_interleaved(&interleaved_f32, channels, sample_rate)?;
    debug!(
        path = %path.display(),
        sample_rate,
        channels,
        samples = buffer.len(),
        "decoded audio"
    );
    Ok(buffer)
}

/// Duration of an audio file in seconds.
///
/// Uses the container's frame count when it is known and decodes the whole file otherwise.
pub fn probe_duration<P: AsRef<Path>>(path: P) -> Result<f64> {
    let path = path.as_ref();
    let format = open_format(path)?;

    let params = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.codec_params.n_frames, t.codec_params.sample_rate))
        .ok_or_else(|| anyhow!("no supported audio tracks found in {}", path.display()))?;

    match params {
        (Some(n_frames), Some(rate)) if rate > 0 => Ok(n_frames as f64 / rate as f64),
        _ => Ok(decode_file(path)?.duration_secs()),
    }
}
