//! Final program assembly
//!
//! Concatenates all processed segments in declared order with the same
//! crossfade used inside segment mixing, so transitions between questions
//! feel continuous rather than abrupt-cut. This is the single point where
//! the total program duration and final byte size become known.

use crate::audio::{concat_crossfaded, encode, AudioClip};
use chrono::{Datelike, Utc};
use radiogen_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Facts about the assembled program file.
#[derive(Debug, Clone, Copy)]
pub struct AssembledProgram {
    pub duration_secs: f64,
    pub file_size: u64,
}

/// Concatenate processed segments into the final program file.
///
/// Inputs must already be canonical; a single segment passes through
/// without crossfading. Writes ID3 title/year tags for downstream players.
pub fn assemble(
    segment_paths: &[PathBuf],
    output: &Path,
    title: &str,
    crossfade: Duration,
) -> Result<AssembledProgram> {
    if segment_paths.is_empty() {
        return Err(Error::Audio(
            "Program assembly requires at least one segment".to_string(),
        ));
    }

    let mut clips = Vec::with_capacity(segment_paths.len());
    for path in segment_paths {
        clips.push(AudioClip::load(path)?);
    }

    let program = concat_crossfaded(clips, crossfade);
    let duration_secs = program.duration_secs();
    program.save(output)?;

    encode::write_tags(output, title, Utc::now().year())?;

    let file_size = std::fs::metadata(output)?.len();
    info!(
        segments = segment_paths.len(),
        duration_secs,
        file_size,
        title,
        "Assembled final program"
    );

    Ok(AssembledProgram {
        duration_secs,
        file_size,
    })
}
