//! Canonical MP3 encoding via LAME
//!
//! The canonical pipeline encoding is 128kbps CBR MP3 at 44.1kHz stereo.
//! Samples are clamped and quantized to i16 before handing them to LAME as
//! planar PCM.

use crate::audio::{CANONICAL_BITRATE_KBPS, CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE};
use id3::TagLike;
use mp3lame_encoder::{Birtate, Builder, DualPcm, FlushNoGap, Quality};
use radiogen_common::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Encode interleaved stereo f32 samples to a canonical MP3 file.
pub fn encode_mp3(samples: &[f32], path: &Path) -> Result<()> {
    let frames = samples.len() / CANONICAL_CHANNELS as usize;

    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for frame in samples.chunks_exact(2) {
        left.push(quantize(frame[0]));
        right.push(quantize(frame[1]));
    }

    let mut builder = Builder::new()
        .ok_or_else(|| Error::Audio("Failed to initialize LAME encoder".to_string()))?;
    builder
        .set_num_channels(CANONICAL_CHANNELS as u8)
        .map_err(|e| Error::Audio(format!("LAME channel setup failed: {}", e)))?;
    builder
        .set_sample_rate(CANONICAL_SAMPLE_RATE)
        .map_err(|e| Error::Audio(format!("LAME sample rate setup failed: {}", e)))?;
    builder
        .set_brate(Birtate::Kbps128)
        .map_err(|e| Error::Audio(format!("LAME bitrate setup failed: {}", e)))?;
    builder
        .set_quality(Quality::Good)
        .map_err(|e| Error::Audio(format!("LAME quality setup failed: {}", e)))?;
    let mut encoder = builder
        .build()
        .map_err(|e| Error::Audio(format!("LAME encoder build failed: {}", e)))?;

    let input = DualPcm {
        left: &left,
        right: &right,
    };

    let mut output: Vec<u8> = Vec::new();
    output.reserve(mp3lame_encoder::max_required_buffer_size(frames));

    let written = encoder
        .encode(input, output.spare_capacity_mut())
        .map_err(|e| Error::Audio(format!("MP3 encode failed: {}", e)))?;
    // SAFETY: LAME wrote `written` initialized bytes into the spare capacity
    unsafe { output.set_len(output.len() + written) };

    let written = encoder
        .flush::<FlushNoGap>(output.spare_capacity_mut())
        .map_err(|e| Error::Audio(format!("MP3 flush failed: {}", e)))?;
    // SAFETY: as above, for the flushed tail
    unsafe { output.set_len(output.len() + written) };

    std::fs::write(path, &output)?;

    debug!(
        path = %path.display(),
        frames,
        bytes = output.len(),
        bitrate_kbps = CANONICAL_BITRATE_KBPS,
        "Encoded canonical MP3"
    );

    Ok(())
}

/// Write descriptive ID3 tags onto a finished program file.
pub fn write_tags(path: &Path, title: &str, year: i32) -> Result<()> {
    let mut tag = id3::Tag::new();
    tag.set_title(title);
    tag.set_year(year);

    tag.write_to_path(path, id3::Version::Id3v24)
        .map_err(|e| Error::Audio(format!("Failed to write tags to {}: {}", path.display(), e)))
}

fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
