//! Per-question segment mixing
//!
//! Combines the ordered answer clips for one question into a single track
//! (pairwise crossfades preserve order), then lays the background-music
//! loop underneath at reduced volume. The foreground voice track keeps its
//! original level and defines the output duration.

use crate::audio::{concat_crossfaded, AudioClip};
use radiogen_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Mix answer clips with a background track into `output`.
///
/// `answer_paths` must contain at least one clip; a single answer passes
/// through without crossfading. All inputs must already be canonical.
pub fn combine(
    answer_paths: &[PathBuf],
    background_path: &Path,
    output: &Path,
    crossfade: Duration,
    background_gain: f32,
) -> Result<()> {
    if answer_paths.is_empty() {
        return Err(Error::Audio(
            "Segment mixing requires at least one answer clip".to_string(),
        ));
    }

    let mut answers = Vec::with_capacity(answer_paths.len());
    for path in answer_paths {
        answers.push(AudioClip::load(path)?);
    }

    let mut foreground = concat_crossfaded(answers, crossfade);
    let background = AudioClip::load(background_path)?;
    foreground.overlay_looped(&background, background_gain);

    debug!(
        answers = answer_paths.len(),
        duration_secs = foreground.duration_secs(),
        background_gain,
        "Mixed question segment"
    );

    foreground.save(output)
}
