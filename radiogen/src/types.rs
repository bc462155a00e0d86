//! Core data model for the program-assembly pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categories of static system audio.
///
/// System assets are silence-eligible: when one is missing from the CDN the
/// pipeline substitutes a silent placeholder rather than failing the run.
/// User recordings are never in this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemAsset {
    Intro,
    Outro,
    Prompt,
    Background,
}

impl SystemAsset {
    /// Placeholder duration when the asset is missing.
    ///
    /// Short bumpers get a short gap; a missing background loop needs enough
    /// silence to underlay a full answer block.
    pub fn default_silence_secs(&self) -> f64 {
        match self {
            SystemAsset::Intro | SystemAsset::Outro => 3.0,
            SystemAsset::Prompt => 5.0,
            SystemAsset::Background => 30.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SystemAsset::Intro => "intro",
            SystemAsset::Outro => "outro",
            SystemAsset::Prompt => "prompt",
            SystemAsset::Background => "background",
        }
    }
}

/// One user-submitted answer recording.
///
/// Recordings are append-only from the pipeline's perspective; creation and
/// deletion happen in an external collaborator. The pipeline only reads the
/// snapshot supplied in the build request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Original file name of the upload
    pub filename: String,
    /// Remote URL the recording can be fetched from
    pub url: String,
    /// Question this recording answers
    pub question_id: String,
    /// Upload timestamp, when the collaborator knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// One ordered unit of the final program.
///
/// The declared order of segments in the build request is the playback order
/// of the final program; the orchestrator never reorders them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// A ready-made clip (intro, outro, spoken prompt).
    Single {
        /// Short name used for workspace file naming and logging
        name: String,
        /// Remote URL of the clip
        url: String,
        /// Which system asset this is; drives placeholder duration
        asset: SystemAsset,
    },
    /// Answer clips for one question, mixed over a background-music loop.
    CombineWithBackground {
        question_id: String,
        /// Ordered answer recordings; at least one is required
        answers: Vec<Recording>,
        /// Background loop URL (system asset, silence-eligible)
        background_url: String,
    },
    /// A requested span of silence.
    Silence { duration_secs: f64 },
}

impl Segment {
    /// Wire name of the segment variant, as written into the manifest.
    pub fn kind(&self) -> &'static str {
        match self {
            Segment::Single { .. } => "single",
            Segment::CombineWithBackground { .. } => "combine_with_background",
            Segment::Silence { .. } => "silence",
        }
    }

    pub fn question_id(&self) -> Option<&str> {
        match self {
            Segment::CombineWithBackground { question_id, .. } => Some(question_id),
            _ => None,
        }
    }

    pub fn answer_count(&self) -> usize {
        match self {
            Segment::CombineWithBackground { answers, .. } => answers.len(),
            _ => 0,
        }
    }
}

/// Fully resolved input for one pipeline run.
///
/// The request-handling layer resolves share codes, ownership, and static
/// asset URLs before constructing this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Thematic category the program belongs to
    pub world: String,
    /// Numeric program id within the world
    pub lmid: u32,
    /// Language code used to resolve static assets (informational here)
    pub language: String,
    /// Program title for metadata tags; a default is derived when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Current snapshot of recordings for this program; drives change detection
    #[serde(default)]
    pub recordings: Vec<Recording>,
    /// Ordered segment plan
    pub segments: Vec<Segment>,
}

impl BuildRequest {
    /// Title written into the program's metadata tags.
    pub fn program_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Radio Program {} #{}", self.world, self.lmid))
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub success: bool,
    /// Public playable URL of the program (current or previously published)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Final program duration in seconds; None when the run was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    pub processing_time_ms: u64,
    pub segment_count: usize,
    /// True when change detection found nothing to rebuild
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
