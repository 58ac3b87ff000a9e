use std::ops::Range;

use tracing::{debug, warn};

use super::{config::SlicerConfig, rms::frame_rms};
use crate::{audio::AudioBuffer, error::SlicerError};

/// Frames `[start, end)` removed between two neighbouring chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SilenceTag {
    start: usize,
    end: usize,
}

/// Amplitude-threshold silence slicer bound to one sampling rate.
///
/// All millisecond parameters are converted to hop-grid frame counts on construction.
#[derive(Debug, Clone)]
pub struct Slicer {
    sample_rate: u32,
    threshold: f32,
    hop_size: usize,
    win_size: usize,
    min_length: usize,
    min_interval: usize,
    max_sil_kept: usize,
}

impl Slicer {
    pub fn new(sample_rate: u32, config: &SlicerConfig) -> Result<Self, SlicerError> {
        config.validate()?;
        if sample_rate == 0 {
            return Err(SlicerError::InvalidConfiguration(
                "sampling rate must be greater than 0".to_string(),
            ));
        }

        let sr = sample_rate as f64;
        let hop_size = (sr * config.hop_size_ms as f64 / 1000.0).round() as usize;
        if hop_size == 0 {
            return Err(SlicerError::InvalidConfiguration(format!(
                "hop_size of {} ms is shorter than one sample at {} Hz",
                config.hop_size_ms, sample_rate
            )));
        }

        let min_interval_samples = sr * config.min_interval_ms as f64 / 1000.0;
        let to_frames = |ms: u32| (sr * ms as f64 / 1000.0 / hop_size as f64).round() as usize;

        Ok(Self {
            sample_rate,
            threshold: 10f32.powf(config.threshold_db / 20.0),
            hop_size,
            win_size: (min_interval_samples.round() as usize).min(4 * hop_size),
            min_length: to_frames(config.min_length_ms),
            min_interval: (min_interval_samples / hop_size as f64).round() as usize,
            max_sil_kept: to_frames(config.max_sil_kept_ms),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Hop between analysis frames, in samples.
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Split `audio` into chunks at qualified silences.
    ///
    /// Always returns at least one chunk; when nothing qualifies as a cut, the single chunk
    /// is a copy of the whole input.
    pub fn slice(&self, audio: &AudioBuffer) -> Vec<AudioBuffer> {
        if audio.sample_rate() != self.sample_rate {
            warn!(
                "slicer built for {}Hz applied to {}Hz audio",
                self.sample_rate,
                audio.sample_rate()
            );
        }
        self.slice_ranges(audio)
            .into_iter()
            .map(|range| audio.slice_range(range))
            .collect()
    }

    /// Sample ranges of the chunks `slice` would return, in order.
    pub fn slice_ranges(&self, audio: &AudioBuffer) -> Vec<Range<usize>> {
        let len = audio.len();
        if len.div_ceil(self.hop_size) <= self.min_length {
            return vec![0..len];
        }

        let mono = audio.mixdown();
        let rms = frame_rms(mono.view(), self.win_size, self.hop_size);
        let tags = self.silence_tags(&rms);

        if tags.is_empty() {
            return vec![0..len];
        }

        let total_frames = rms.len();
        let mut ranges = Vec::with_capacity(tags.len() + 1);
        if tags[0].start > 0 {
            ranges.push(self.frame_range(0, tags[0].start, len));
        }
        for pair in tags.windows(2) {
            ranges.push(self.frame_range(pair[0].end, pair[1].start, len));
        }
        if let Some(last) = tags.last() {
            if last.end < total_frames {
                ranges.push(self.frame_range(last.end, total_frames, len));
            }
        }
        ranges.retain(|r| r.start < r.end);

        if ranges.is_empty() {
            return vec![0..len];
        }

        debug!(
            samples = len,
            frames = total_frames,
            silences = tags.len(),
            chunks = ranges.len(),
            "sliced audio"
        );
        ranges
    }

    fn frame_range(&self, begin: usize, end: usize, len: usize) -> Range<usize> {
        (begin * self.hop_size).min(len)..(end * self.hop_size).min(len)
    }

    /// Scan the frame energies left to right and collect the silence ranges to remove.
    fn silence_tags(&self, rms: &[f32]) -> Vec<SilenceTag> {
        let mut tags = Vec::new();
        let mut silence_start: Option<usize> = None;
        let mut clip_start = 0usize;
        // Set once a chunk has been closed; later chunks are interior and must reach min_length.
        let mut chunk_emitted = false;

        for (i, &value) in rms.iter().enumerate() {
            if value < self.threshold {
                silence_start.get_or_insert(i);
                continue;
            }
            let Some(start) = silence_start.take() else {
                continue;
            };

            let is_leading_silence = start == 0 && i > self.max_sil_kept;
            let need_slice_middle =
                i - start >= self.min_interval && i - clip_start >= self.min_length;
            if !is_leading_silence && !need_slice_middle {
                continue;
            }

            let tag = self.place_cut(rms, start, i);
            if chunk_emitted && tag.start.saturating_sub(clip_start) < self.min_length {
                continue;
            }
            chunk_emitted |= tag.start > 0;
            clip_start = tag.end;
            tags.push(tag);
        }

        let total_frames = rms.len();
        if let Some(start) = silence_start.filter(|&s| total_frames - s >= self.min_interval) {
            let silence_end = total_frames.min(start + self.max_sil_kept);
            let pos = argmin(rms, start, silence_end);
            tags.push(SilenceTag {
                start: pos,
                end: total_frames + 1,
            });
        }

        tags
    }

    /// Decide which frames of the silent run `[start, end)` are removed.
    fn place_cut(&self, rms: &[f32], start: usize, end: usize) -> SilenceTag {
        let length = end - start;
        let leading = start == 0;

        if length <= self.max_sil_kept {
            let pos = argmin(rms, start, end);
            return if leading {
                SilenceTag { start: 0, end: pos }
            } else {
                SilenceTag { start: pos, end: pos }
            };
        }

        let pos_l = argmin(rms, start, start + self.max_sil_kept);
        let pos_r = argmin(rms, end - self.max_sil_kept, end);

        if leading {
            return SilenceTag { start: 0, end: pos_r };
        }

        if length <= self.max_sil_kept * 2 {
            let pos = argmin(rms, start + length.div_ceil(2), end);
            SilenceTag {
                start: pos_l.min(pos),
                end: pos_r.max(pos),
            }
        } else {
            SilenceTag {
                start: pos_l,
                end: pos_r,
            }
        }
    }
}

/// Index of the first minimum of `values[lo..=hi]`, with `hi` clamped to the slice.
fn argmin(values: &[f32], lo: usize, hi: usize) -> usize {
    let hi = hi.min(values.len().saturating_sub(1));
    let mut best = lo;
    for i in lo..=hi {
        if values[i] < values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    const SR: u32 = 1000;
    const LOUD: f32 = 0.5;

    // At 1 kHz: hop = 10 samples, window = 40 samples, min_length = 500 frames,
    // min_interval = 30 frames, max_sil_kept = 50 frames.
    fn slicer() -> Slicer {
        Slicer::new(SR, &SlicerConfig::default()).unwrap()
    }

    /// Alternating loud / silent spans, starting with loud.
    fn signal(spans: &[(bool, usize)]) -> AudioBuffer {
        let mut samples = Vec::new();
        for &(loud, len) in spans {
            samples.extend(std::iter::repeat_n(if loud { LOUD } else { 0.0 }, len));
        }
        AudioBuffer::mono(samples, SR)
    }

    #[test]
    fn test_frame_conversion() {
        let s = slicer();
        assert_eq!(s.hop_size, 10);
        assert_eq!(s.win_size, 40);
        assert_eq!(s.min_length, 500);
        assert_eq!(s.min_interval, 30);
        assert_eq!(s.max_sil_kept, 50);
        assert!((s.threshold - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_configuration_fails_on_construction() {
        let config = SlicerConfig {
            min_interval_ms: 5,
            ..SlicerConfig::default()
        };
        assert!(matches!(
            Slicer::new(SR, &config),
            Err(SlicerError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Slicer::new(0, &SlicerConfig::default()),
            Err(SlicerError::InvalidConfiguration(_))
        ));
        // 10 ms at 40 Hz rounds to zero samples.
        assert!(matches!(
            Slicer::new(40, &SlicerConfig::default()),
            Err(SlicerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_short_input_is_returned_whole() {
        let audio = signal(&[(true, 1000), (false, 1000), (true, 1000)]);
        assert_eq!(slicer().slice_ranges(&audio), vec![0..3000]);
    }

    #[test]
    fn test_empty_input_passes_through() {
        let audio = AudioBuffer::mono(Vec::new(), SR);
        let chunks = slicer().slice(&audio);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty());
    }

    #[test]
    fn test_loud_audio_is_one_full_chunk() {
        let audio = signal(&[(true, 10_000)]);
        let chunks = slicer().slice(&audio);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], audio);
    }

    #[test]
    fn test_silence_shorter_than_min_interval_is_ignored() {
        // 17 silent frames.
        let audio = signal(&[(true, 6000), (false, 200), (true, 6000)]);
        assert_eq!(slicer().slice_ranges(&audio), vec![0..12_200]);
    }

    #[test]
    fn test_silence_of_exactly_min_interval_cuts_once() {
        // Silent frames 602..=631: exactly 30.
        let audio = signal(&[(true, 6000), (false, 330), (true, 6000)]);
        assert_eq!(
            slicer().slice_ranges(&audio),
            vec![0..6020, 6020..12_330]
        );
    }

    #[test]
    fn test_cut_suppressed_when_clip_too_short() {
        // Only 299 frames since the clip started: below min_length.
        let audio = signal(&[(true, 2000), (false, 1000), (true, 8000)]);
        assert_eq!(slicer().slice_ranges(&audio), vec![0..11_000]);
    }

    #[test]
    fn test_short_interior_phrase_is_not_emitted() {
        // 100 samples of sound between two long silences would form a 61-frame interior chunk.
        let audio = signal(&[
            (true, 6000),
            (false, 1000),
            (true, 100),
            (false, 5000),
            (true, 6000),
        ]);
        let ranges = slicer().slice_ranges(&audio);

        assert_eq!(ranges, vec![0..6020, 6510..18_100]);
        let s = slicer();
        for range in &ranges[1..ranges.len() - 1] {
            assert!(range.len() >= s.min_length * s.hop_size, "{range:?}");
        }
    }

    #[test]
    fn test_medium_silence_resumes_in_second_half() {
        // Silent frames 602..=698 (97 frames, between max_sil_kept and twice that).
        let audio = signal(&[(true, 6000), (false, 1000), (true, 6000)]);
        let ranges = slicer().slice_ranges(&audio);

        assert_eq!(ranges, vec![0..6020, 6510..13_000]);
        let silence_start = 602;
        let silence_len = 97;
        let resume_frame = ranges[1].start / 10;
        assert!(resume_frame * 2 >= silence_start * 2 + silence_len);
    }

    #[test]
    fn test_medium_silence_picks_quietest_frame_in_second_half() {
        let mut samples = vec![LOUD; 6000];
        // Low-level noise above zero, with one dip early and one dip late in the gap.
        samples.extend(std::iter::repeat_n(0.002f32, 1000));
        samples.extend(vec![LOUD; 6000]);
        for s in &mut samples[6100..6140] {
            *s = 0.0;
        }
        for s in &mut samples[6800..6840] {
            *s = 0.0;
        }
        let audio = AudioBuffer::mono(samples, SR);
        let ranges = slicer().slice_ranges(&audio);

        assert_eq!(ranges.len(), 2);
        // Dip at frame 682 wins the second-half search.
        assert_eq!(ranges[1].start, 6820);
        assert!(ranges[0].end <= 6520);
    }

    #[test]
    fn test_long_silence_is_trimmed_from_both_sides() {
        // Silent frames 602..=898 (297 frames).
        let audio = signal(&[(true, 6000), (false, 3000), (true, 6000)]);
        assert_eq!(
            slicer().slice_ranges(&audio),
            vec![0..6020, 8490..15_000]
        );
    }

    #[test]
    fn test_leading_silence_is_trimmed() {
        // Silent frames 0..=98.
        let audio = signal(&[(false, 1000), (true, 8000)]);
        assert_eq!(slicer().slice_ranges(&audio), vec![490..9000]);
    }

    #[test]
    fn test_trailing_silence_is_trimmed() {
        // Silent frames 802..=900, open at the end of the scan.
        let audio = signal(&[(true, 8000), (false, 1000)]);
        assert_eq!(slicer().slice_ranges(&audio), vec![0..8020]);
    }

    #[test]
    fn test_chunks_are_ordered_and_disjoint() {
        let spans = [
            (true, 7000),
            (false, 450),
            (true, 5300),
            (false, 2500),
            (true, 900),
            (false, 120),
            (true, 6100),
            (false, 800),
            (true, 5200),
            (false, 1900),
        ];
        let audio = signal(&spans);
        let ranges = slicer().slice_ranges(&audio);

        assert!(!ranges.is_empty());
        assert!(ranges.len() > 1);
        let mut previous_end = 0;
        for range in &ranges {
            assert!(range.start >= previous_end);
            assert!(range.start < range.end);
            assert!(range.end <= audio.len());
            previous_end = range.end;
        }
        let kept: usize = ranges.iter().map(|r| r.len()).sum();
        assert!(kept <= audio.len());

        let s = slicer();
        assert!(ranges.len() > 2);
        for range in &ranges[1..ranges.len() - 1] {
            assert!(range.len() >= s.min_length * s.hop_size, "{range:?}");
        }
    }

    #[test]
    fn test_stereo_chunks_keep_channel_layout() {
        let mono = signal(&[(true, 6000), (false, 330), (true, 6000)]);
        let left = mono.samples().row(0).to_owned();
        let right = left.mapv(|x| x * 0.5);
        let mut stereo = Array2::zeros((2, left.len()));
        stereo.row_mut(0).assign(&left);
        stereo.row_mut(1).assign(&right);
        let audio = AudioBuffer::new(stereo, SR);

        let chunks = slicer().slice(&audio);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert_eq!(chunk.channels(), 2);
            assert_eq!(chunk.sample_rate(), SR);
        }
        assert_eq!(chunks[0].len(), 6020);
        assert_eq!(chunks[1].samples(), audio.slice_range(6020..12_330).samples());
    }
}
