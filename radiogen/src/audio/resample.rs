//! Sample rate conversion using rubato
//!
//! All pipeline audio is normalized to the canonical 44.1kHz rate before
//! mixing. FastFixedIn gives a good quality/performance tradeoff for
//! spoken-word material; the whole clip is processed as a single chunk.

use crate::audio::{CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE};
use radiogen_common::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

/// Resample interleaved stereo audio to the canonical rate.
///
/// Returns the input unchanged when it is already at 44.1kHz.
pub fn to_canonical_rate(input: &[f32], input_rate: u32) -> Result<Vec<f32>> {
    if input_rate == CANONICAL_SAMPLE_RATE {
        return Ok(input.to_vec());
    }

    let channels = CANONICAL_CHANNELS as usize;
    let planar_input = deinterleave(input, channels);
    let input_frames = planar_input[0].len();
    if input_frames == 0 {
        return Ok(Vec::new());
    }

    debug!(
        input_rate,
        output_rate = CANONICAL_SAMPLE_RATE,
        input_frames,
        "Resampling to canonical rate"
    );

    let mut resampler = FastFixedIn::<f32>::new(
        CANONICAL_SAMPLE_RATE as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        channels,
    )
    .map_err(|e| Error::Audio(format!("Failed to create resampler: {}", e)))?;

    let planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| Error::Audio(format!("Resampling failed: {}", e)))?;

    Ok(interleave(&planar_output))
}

/// [L, R, L, R, ...] to [[L, L, ...], [R, R, ...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];

    for frame in 0..frames {
        for (ch, lane) in planar.iter_mut().enumerate() {
            lane.push(samples[frame * channels + ch]);
        }
    }

    planar
}

/// [[L, L, ...], [R, R, ...]] to [L, R, L, R, ...]
fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    if planar.is_empty() {
        return Vec::new();
    }

    let channels = planar.len();
    let frames = planar[0].len();
    let mut interleaved = Vec::with_capacity(frames * channels);

    for frame in 0..frames {
        for lane in planar {
            interleaved.push(lane[frame]);
        }
    }

    interleaved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave() {
        let planar = deinterleave(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2);
        assert_eq!(planar[0], vec![1.0, 3.0, 5.0]);
        assert_eq!(planar[1], vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_interleave() {
        let planar = vec![vec![1.0, 3.0], vec![2.0, 4.0]];
        assert_eq!(interleave(&planar), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_same_rate_is_passthrough() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        let output = to_canonical_rate(&input, CANONICAL_SAMPLE_RATE).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_resample_48k_to_44k() {
        let input_rate = 48_000;
        let frames = 4800; // 100ms
        let mut input = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let t = i as f32 / input_rate as f32;
            let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
            input.push(sample);
            input.push(sample);
        }

        let output = to_canonical_rate(&input, input_rate).unwrap();
        let output_frames = output.len() / 2;
        let expected = (frames as f64 * 44100.0 / input_rate as f64) as usize;

        // Resampler internals may shift the count by a few frames
        assert!(
            output_frames.abs_diff(expected) <= 16,
            "expected ~{} frames, got {}",
            expected,
            output_frames
        );
    }

    #[test]
    fn test_resample_empty_input() {
        let output = to_canonical_rate(&[], 48_000).unwrap();
        assert!(output.is_empty());
    }
}
