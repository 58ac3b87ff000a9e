use ndarray::ArrayView1;

/// RMS of `samples` on a hop grid, zero-padded by `frame_length / 2` on both sides.
///
/// Frame `t` covers padded samples `[t * hop_length, t * hop_length + frame_length)`, so it is
/// centred on original sample `t * hop_length`.
pub(crate) fn frame_rms(samples: ArrayView1<'_, f32>, frame_length: usize, hop_length: usize) -> Vec<f32> {
    if frame_length == 0 || hop_length == 0 {
        return Vec::new();
    }

    let pad = frame_length / 2;
    let padded_len = samples.len() + 2 * pad;
    if padded_len < frame_length {
        return Vec::new();
    }
    let n_frames = 1 + (padded_len - frame_length) / hop_length;

    // Prefix sums of squares over the padded signal; padding contributes nothing.
    let mut prefix = Vec::with_capacity(padded_len + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for i in 0..padded_len {
        if i >= pad && i - pad < samples.len() {
            let x = samples[i - pad] as f64;
            acc += x * x;
        }
        prefix.push(acc);
    }

    (0..n_frames)
        .map(|t| {
            let start = t * hop_length;
            let end = start + frame_length;
            let power = (prefix[end] - prefix[start]).max(0.0) / frame_length as f64;
            power.sqrt() as f32
        })
        .collect()
}
