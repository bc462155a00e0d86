//! In-memory audio clip operations
//!
//! An `AudioClip` is interleaved stereo f32 at the canonical rate. Clips are
//! the unit the mixer and assembler operate on: crossfaded concatenation and
//! volume-weighted background overlay both happen here, in the sample
//! domain.

use crate::audio::{decode, encode, resample, CANONICAL_SAMPLE_RATE};
use radiogen_common::{FadeCurve, Result};
use std::path::Path;
use std::time::Duration;

/// Interleaved stereo audio at the canonical sample rate.
#[derive(Debug, Clone, Default)]
pub struct AudioClip {
    samples: Vec<f32>,
}

impl AudioClip {
    /// Wrap raw interleaved stereo samples already at the canonical rate.
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    /// A silent clip of the requested duration.
    pub fn silence(duration_secs: f64) -> Self {
        let frames = (duration_secs * CANONICAL_SAMPLE_RATE as f64).round() as usize;
        Self {
            samples: vec![0.0; frames * 2],
        }
    }

    /// Decode a file and normalize it to the canonical rate.
    pub fn load(path: &Path) -> Result<Self> {
        let decoded = decode::decode_file(path)?;
        let samples = resample::to_canonical_rate(&decoded.samples, decoded.sample_rate)?;
        Ok(Self { samples })
    }

    /// Encode the clip to a canonical MP3 file.
    pub fn save(&self, path: &Path) -> Result<()> {
        encode::encode_mp3(&self.samples, path)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / CANONICAL_SAMPLE_RATE as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append `next` with an equal-power crossfade over `fade`.
    ///
    /// The overlap is shortened when either clip is shorter than the fade,
    /// so very short clips degrade to a butt join instead of being swallowed.
    /// Resulting length: self + next - overlap.
    pub fn append_crossfaded(&mut self, next: &AudioClip, fade: Duration) {
        let fade_frames = (fade.as_secs_f64() * CANONICAL_SAMPLE_RATE as f64).round() as usize;
        let overlap = fade_frames.min(self.frames()).min(next.frames());

        if overlap == 0 {
            self.samples.extend_from_slice(&next.samples);
            return;
        }

        let curve = FadeCurve::EqualPower;
        let base = self.frames() - overlap;

        for i in 0..overlap {
            let t = (i as f32 + 0.5) / overlap as f32;
            let out_gain = curve.fade_out(t);
            let in_gain = curve.fade_in(t);
            for ch in 0..2 {
                let idx = (base + i) * 2 + ch;
                self.samples[idx] =
                    self.samples[idx] * out_gain + next.samples[i * 2 + ch] * in_gain;
            }
        }

        self.samples.extend_from_slice(&next.samples[overlap * 2..]);
    }

    /// Mix a background clip underneath this one at reduced volume.
    ///
    /// The foreground keeps its original level and defines the output
    /// duration; the background is looped when shorter and truncated when
    /// longer. The sum is clamped to [-1, 1].
    pub fn overlay_looped(&mut self, background: &AudioClip, gain: f32) {
        if background.is_empty() || self.is_empty() {
            return;
        }

        let bg_frames = background.frames();
        for frame in 0..self.frames() {
            let bg_frame = frame % bg_frames;
            for ch in 0..2 {
                let idx = frame * 2 + ch;
                let mixed = self.samples[idx] + background.samples[bg_frame * 2 + ch] * gain;
                self.samples[idx] = mixed.clamp(-1.0, 1.0);
            }
        }
    }
}

/// Concatenate clips in order with a crossfade at each boundary.
///
/// A single clip passes through unchanged; crossfading a single input is
/// degenerate.
pub fn concat_crossfaded(clips: Vec<AudioClip>, fade: Duration) -> AudioClip {
    let mut iter = clips.into_iter();
    let mut result = match iter.next() {
        Some(first) => first,
        None => return AudioClip::default(),
    };

    for clip in iter {
        result.append_crossfaded(&clip, fade);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_clip(frames: usize, value: f32) -> AudioClip {
        AudioClip::from_samples(vec![value; frames * 2])
    }

    #[test]
    fn test_silence_duration() {
        let clip = AudioClip::silence(3.0);
        assert_eq!(clip.frames(), 3 * CANONICAL_SAMPLE_RATE as usize);
        assert!((clip.duration_secs() - 3.0).abs() < 1e-9);
        assert!(clip.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_crossfade_length_arithmetic() {
        let fade = Duration::from_secs(1);
        let fade_frames = CANONICAL_SAMPLE_RATE as usize;

        let mut a = constant_clip(3 * fade_frames, 0.5);
        let b = constant_clip(2 * fade_frames, 0.5);
        a.append_crossfaded(&b, fade);

        // 3s + 2s - 1s overlap
        assert_eq!(a.frames(), 4 * fade_frames);
    }

    #[test]
    fn test_crossfade_shorter_than_fade() {
        let fade = Duration::from_secs(1);
        let mut a = constant_clip(100, 0.5);
        let b = constant_clip(50, 0.5);
        a.append_crossfaded(&b, fade);

        // Overlap limited to the shorter clip
        assert_eq!(a.frames(), 100);
    }

    #[test]
    fn test_crossfade_zero_fade_is_concat() {
        let mut a = constant_clip(100, 0.1);
        let b = constant_clip(200, 0.2);
        a.append_crossfaded(&b, Duration::ZERO);
        assert_eq!(a.frames(), 300);
    }

    #[test]
    fn test_equal_power_crossfade_of_equal_signals_keeps_level() {
        // Crossfading two identical constant signals with equal-power curves
        // must not dip: sin(x) + cos(x) >= 1 on [0, pi/2].
        let fade = Duration::from_millis(100);
        let fade_frames = (CANONICAL_SAMPLE_RATE as usize) / 10;

        let mut a = constant_clip(2 * fade_frames, 0.5);
        let b = constant_clip(2 * fade_frames, 0.5);
        a.append_crossfaded(&b, fade);

        let overlap_start = (2 * fade_frames - fade_frames) * 2;
        let overlap_end = 2 * fade_frames * 2;
        for &sample in &a.samples()[overlap_start..overlap_end] {
            assert!(sample >= 0.5 - 1e-3, "level dipped to {}", sample);
        }
    }

    #[test]
    fn test_concat_single_clip_passthrough() {
        let clip = constant_clip(500, 0.3);
        let expected = clip.samples().to_vec();
        let result = concat_crossfaded(vec![clip], Duration::from_secs(1));

        // No crossfade applied to a single input
        assert_eq!(result.samples(), expected.as_slice());
    }

    #[test]
    fn test_concat_empty_list() {
        let result = concat_crossfaded(vec![], Duration::from_secs(1));
        assert!(result.is_empty());
    }

    #[test]
    fn test_overlay_preserves_foreground_duration() {
        let mut fg = constant_clip(1000, 0.5);
        let bg = constant_clip(300, 1.0);
        fg.overlay_looped(&bg, 0.1);

        assert_eq!(fg.frames(), 1000);
        // Background loops across the whole foreground
        assert!((fg.samples()[0] - 0.6).abs() < 1e-6);
        assert!((fg.samples()[999 * 2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_overlay_truncates_longer_background() {
        let mut fg = constant_clip(100, 0.0);
        let bg = constant_clip(10_000, 1.0);
        fg.overlay_looped(&bg, 0.1);

        assert_eq!(fg.frames(), 100);
        assert!((fg.samples()[0] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_overlay_clamps() {
        let mut fg = constant_clip(10, 0.95);
        let bg = constant_clip(10, 1.0);
        fg.overlay_looped(&bg, 0.5);

        assert!(fg.samples().iter().all(|&s| s <= 1.0));
    }

    #[test]
    fn test_mp3_round_trip_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");

        let clip = AudioClip::silence(2.0);
        clip.save(&path).unwrap();

        let loaded = AudioClip::load(&path).unwrap();
        // LAME adds encoder delay/padding; allow a small margin
        assert!(
            (loaded.duration_secs() - 2.0).abs() < 0.2,
            "duration {} not near 2.0",
            loaded.duration_secs()
        );
    }
}
