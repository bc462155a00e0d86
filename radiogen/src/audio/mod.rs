//! Audio engine: decode, resample, mix, encode
//!
//! Every pipeline stage operates on one canonical encoding so stages can be
//! composed without format negotiation. Internally all mixing happens on
//! interleaved stereo f32 at the canonical rate; files are re-encoded at
//! stage boundaries.

pub mod clip;
pub mod decode;
pub mod encode;
pub mod resample;

pub use clip::{concat_crossfaded, AudioClip};

/// Canonical sample rate all pipeline audio is normalized to.
pub const CANONICAL_SAMPLE_RATE: u32 = 44_100;

/// Canonical channel count (stereo).
pub const CANONICAL_CHANNELS: u16 = 2;

/// Canonical MP3 bitrate in kbps.
pub const CANONICAL_BITRATE_KBPS: u32 = 128;
