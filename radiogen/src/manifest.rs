//! Build manifest and change detection
//!
//! The manifest is the persisted record of the last successful build. It is
//! read once per run (to decide whether a rebuild is needed at all) and
//! written once, only after the audio artifact has been published. A failed
//! build never touches it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Current manifest wire format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Persisted record of the last successful build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub world: String,
    pub lmid: u32,
    /// Public playable URL of the published program
    pub program_url: String,
    pub file_name: String,
    /// Final program size in bytes
    pub file_size: u64,
    /// Build processing time in milliseconds
    pub processing_time: u64,
    pub segment_count: usize,
    /// Recording count the program was built from. Optional because legacy
    /// manifests predate the field; those are treated as always stale so one
    /// rebuild backfills it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_count: Option<u32>,
    pub segments: Vec<ManifestSegment>,
}

/// Descriptor of one segment in playback order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSegment {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub answer_count: usize,
}

/// Stable manifest file name for a program.
pub fn manifest_file_name(world: &str, lmid: u32) -> String {
    format!("manifest-{}-{}.json", world, lmid)
}

/// Decide whether a rebuild is required.
///
/// Counting recordings is cheap and robust to renames; filename diffing
/// produced false results on edits that rename files without changing
/// content. This check runs before any download is attempted.
pub fn needs_rebuild(current_count: u32, previous: Option<&Manifest>) -> bool {
    match previous {
        None => true,
        Some(manifest) => match manifest.recording_count {
            // Legacy manifest without a count: force one rebuild to backfill
            None => true,
            Some(previous_count) => previous_count != current_count,
        },
    }
}

/// Fetch the previously published manifest, if any.
///
/// Every failure mode (404, transport error, malformed JSON) collapses to
/// `None`: change detection must never make the pipeline less available, so
/// an unreadable manifest simply forces a rebuild.
pub async fn fetch_previous(client: &reqwest::Client, url: &str) -> Option<Manifest> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(url, error = %e, "Previous manifest not reachable, forcing rebuild");
            return None;
        }
    };

    if !response.status().is_success() {
        debug!(url, status = %response.status(), "No previous manifest, forcing rebuild");
        return None;
    }

    match response.json::<Manifest>().await {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            warn!(url, error = %e, "Previous manifest is malformed, forcing rebuild");
            None
        }
    }
}
