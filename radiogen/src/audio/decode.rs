//! Audio decoding and probing using symphonia
//!
//! Recordings arrive in whatever container and codec the user's device
//! produced (WebM/Opus from browsers, M4A from phones, MP3/WAV from
//! uploads). Everything is decoded to interleaved stereo f32 at its native
//! rate; resampling to the canonical rate happens separately.

use crate::audio::{CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE};
use radiogen_common::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_MP3};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decoded audio: interleaved stereo f32 at the file's native rate.
#[derive(Debug)]
pub struct DecodedAudio {
    /// Interleaved stereo samples [L, R, L, R, ...]
    pub samples: Vec<f32>,
    /// Native sample rate of the source file
    pub sample_rate: u32,
}

/// Container/codec facts discovered without decoding.
#[derive(Debug, Clone, Copy)]
pub struct AudioProbe {
    pub is_mp3: bool,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

impl AudioProbe {
    /// Whether the file already matches the canonical encoding, making a
    /// transcode unnecessary.
    pub fn is_canonical(&self) -> bool {
        self.is_mp3
            && self.sample_rate == Some(CANONICAL_SAMPLE_RATE)
            && self.channels == Some(CANONICAL_CHANNELS)
    }
}

/// Probe a file's encoding without decoding its payload.
pub fn probe_file(path: &Path) -> Result<AudioProbe> {
    let format = open_format(path)?;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Audio(format!("No audio track in {}", path.display())))?;

    let params = &track.codec_params;
    Ok(AudioProbe {
        is_mp3: params.codec == CODEC_TYPE_MP3,
        sample_rate: params.sample_rate,
        channels: params.channels.map(|c| c.count() as u16),
    })
}

/// Decode an entire file to interleaved stereo f32.
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let mut format = open_format(path)?;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Audio(format!("No audio track in {}", path.display())))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params.sample_rate.unwrap_or(CANONICAL_SAMPLE_RATE);
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Audio(format!("Unsupported codec in {}: {}", path.display(), e)))?;

    let mut native_samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(Error::Audio(format!(
                    "Failed reading {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is recoverable; skip it and keep going
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(path = %path.display(), error = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => {
                return Err(Error::Audio(format!(
                    "Decode failed for {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            let capacity = decoded.capacity() as u64;
            sample_buf = Some(SampleBuffer::<f32>::new(capacity, spec));
        }

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            native_samples.extend_from_slice(buf.samples());
        }
    }

    if native_samples.is_empty() {
        return Err(Error::Audio(format!(
            "No decodable audio in {}",
            path.display()
        )));
    }

    let samples = to_stereo(&native_samples, channels);
    debug!(
        path = %path.display(),
        sample_rate,
        channels,
        frames = samples.len() / 2,
        "Decoded audio file"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

fn open_format(path: &Path) -> Result<Box<dyn symphonia::core::formats::FormatReader>> {
    let file = File::open(path)
        .map_err(|_| Error::NotFound(format!("Audio file not found: {}", path.display())))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Audio(format!("Unrecognized format in {}: {}", path.display(), e)))?;

    Ok(probed.format)
}

/// Convert interleaved samples of any channel count to interleaved stereo.
fn to_stereo(samples: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        // Mono: duplicate to both channels
        1 => {
            let mut stereo = Vec::with_capacity(samples.len() * 2);
            for &sample in samples {
                stereo.push(sample);
                stereo.push(sample);
            }
            stereo
        }
        2 => samples.to_vec(),
        // Multi-channel: average alternating channels into left/right
        n => {
            let frames = samples.len() / n;
            let mut stereo = Vec::with_capacity(frames * 2);
            let half = (n as f32 / 2.0).max(1.0);
            for frame in 0..frames {
                let mut left = 0.0f32;
                let mut right = 0.0f32;
                for ch in 0..n {
                    let sample = samples[frame * n + ch];
                    if ch % 2 == 0 {
                        left += sample;
                    } else {
                        right += sample;
                    }
                }
                stereo.push(left / half);
                stereo.push(right / half);
            }
            stereo
        }
    }
}
