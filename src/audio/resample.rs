//! Sample-rate and channel conversion for the output device.
//!
//! Synthesised speech arrives as 24 kHz mono while output devices commonly
//! run at 44.1/48 kHz stereo.  [`CpalOutput`](crate::audio::CpalOutput)
//! converts each buffer once, before the stream starts:
//!
//! 1. [`resample_linear`] — any source rate to the device rate.
//! 2. [`remix_channels`] — mono ↔ interleaved device channels.
//!
//! The resampler uses linear interpolation; speech is band-limited well
//! below the device Nyquist rate so the aliasing is inaudible.

// ---------------------------------------------------------------------------
// resample_linear
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` to `target_rate` Hz using
/// linear interpolation.
///
/// * Equal rates return the input unchanged (no interpolation).
/// * Empty input or a zero rate returns an empty vector.
///
/// The output length is `ceil(samples.len() * target_rate / source_rate)`.
///
/// # Example
///
/// ```rust
/// use smartread::audio::resample_linear;
///
/// // 24 kHz → 48 kHz doubles the length
/// let speech = vec![0.5_f32; 240];
/// assert_eq!(resample_linear(&speech, 24_000, 48_000).len(), 480);
///
/// // Same rate — no-op
/// assert_eq!(resample_linear(&speech, 24_000, 24_000).len(), 240);
/// ```
pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }

    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Channel conversion
// ---------------------------------------------------------------------------

/// Average interleaved frames down to mono.
///
/// * `channels == 1` returns the input as an owned `Vec`.
/// * `channels == 0` returns an empty vector.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

/// Convert interleaved `samples` from `source` to `target` channels.
///
/// Mono input is duplicated into every output channel; anything else is
/// downmixed to mono first.
///
/// ```rust
/// use smartread::audio::remix_channels;
///
/// let mono = vec![0.1_f32, 0.2];
/// assert_eq!(remix_channels(&mono, 1, 2), vec![0.1, 0.1, 0.2, 0.2]);
/// ```
pub fn remix_channels(samples: &[f32], source: u16, target: u16) -> Vec<f32> {
    if source == target {
        return samples.to_vec();
    }
    let mono = downmix_to_mono(samples, source);
    match target {
        0 => Vec::new(),
        1 => mono,
        n => mono
            .iter()
            .flat_map(|&s| std::iter::repeat(s).take(n as usize))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsample_preserves_constant_signal() {
        let input = vec![0.25_f32; 100];
        let out = resample_linear(&input, 24_000, 44_100);
        assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
        assert_eq!(out.len(), 184);
    }

    #[test]
    fn downsample_length() {
        let input = vec![0.0_f32; 480];
        assert_eq!(resample_linear(&input, 48_000, 16_000).len(), 160);
    }

    #[test]
    fn interpolates_midpoints() {
        let out = resample_linear(&[0.0, 1.0], 1, 2);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_and_zero_rate() {
        assert!(resample_linear(&[], 24_000, 48_000).is_empty());
        assert!(resample_linear(&[0.1], 0, 48_000).is_empty());
    }

    #[test]
    fn stereo_downmix_averages() {
        let mono = downmix_to_mono(&[1.0, 0.0, 0.5, 0.5], 2);
        assert_eq!(mono, vec![0.5, 0.5]);
    }

    #[test]
    fn remix_stereo_to_mono_and_same() {
        assert_eq!(remix_channels(&[1.0, 0.0], 2, 1), vec![0.5]);
        assert_eq!(remix_channels(&[0.3, 0.4], 2, 2), vec![0.3, 0.4]);
        assert!(remix_channels(&[0.3], 1, 0).is_empty());
    }
}
