use std::ops::Range;

use anyhow::{anyhow, Result};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};

/// Planar PCM samples with shape (channels, samples) plus the rate they were recorded at.
///
/// Mono audio is a single row. Chunks produced by the slicer are `AudioBuffer`s as well,
/// so they keep the channel layout of the recording they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Array2<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Array2<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(Array1::from(samples).insert_axis(Axis(0)), sample_rate)
    }

    /// Build a buffer from frame-interleaved samples (`L R L R ...`).
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(data: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(anyhow!("channel count must be at least 1"));
        }
        let frames = data.len() / channels;
        let interleaved = Array2::from_shape_vec((frames, channels), data[..frames * channels].to_vec())?;
        let planar = interleaved.reversed_axes().as_standard_layout().to_owned();
        Ok(Self::new(planar, sample_rate))
    }

    pub fn to_interleaved(&self) -> Vec<f32> {
        self.samples.t().iter().copied().collect()
    }

    pub fn samples(&self) -> ArrayView2<'_, f32> {
        self.samples.view()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.samples.nrows()
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.samples.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Arithmetic mean across channels, used as the analysis signal for multi-channel input.
    pub fn mixdown(&self) -> Array1<f32> {
        self.samples
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.len()))
    }

    /// Copy out the sample range `range`, clamped to the buffer length.
    pub fn slice_range(&self, range: Range<usize>) -> AudioBuffer {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        AudioBuffer::new(
            self.samples.slice(s![.., start..end]).to_owned(),
            self.sample_rate,
        )
    }
}
