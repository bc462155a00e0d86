//! Silent placeholder synthesis
//!
//! When a static system asset (intro, outro, prompt, background loop) is
//! missing from the CDN, the pipeline substitutes silence of a
//! type-appropriate duration so assembly can proceed. A program with a
//! silent gap ships; a program that fails to build does not. User
//! recordings are never silenced; that decision lives in the orchestrator's
//! asset classification, not here.

use crate::audio::AudioClip;
use radiogen_common::Result;
use std::path::Path;
use tracing::debug;

/// Synthesize a silent clip of `duration_secs` in the canonical encoding.
///
/// No network access; the only failure mode is the encoder itself, which is
/// fatal to the run.
pub fn generate_silence(path: &Path, duration_secs: f64) -> Result<()> {
    debug!(path = %path.display(), duration_secs, "Generating silent placeholder");
    AudioClip::silence(duration_secs).save(path)
}
