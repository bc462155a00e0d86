//! Error types for the pipeline crate
//!
//! Fatal errors abort the run, trigger workspace cleanup, and surface in the
//! BuildResult. Two failure classes are deliberately non-fatal and never
//! appear here: a missing system asset (replaced with silence inside the
//! download stage) and a failed manifest upload (logged after the audio
//! artifact is already published).

use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Fatal pipeline failures, by stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transient network/storage failure that survived all retries
    #[error("Download failed for {url}: {source}")]
    Download {
        url: String,
        source: radiogen_common::Error,
    },

    /// A required user recording could not be fetched. Never recovered with
    /// silence; a program missing user content is worse than no program.
    #[error("Required user recording unavailable: {url}")]
    MissingUserAsset { url: String },

    /// The audio engine rejected a mix input
    #[error("Mixing failed for question {question_id}: {message}")]
    Mix {
        question_id: String,
        message: String,
    },

    /// Final concatenation or tagging failed
    #[error("Program assembly failed: {0}")]
    Assemble(String),

    /// Audio artifact upload failed; aborts before the manifest is written
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Shared infrastructure failure (workspace creation, placeholder
    /// synthesis, config)
    #[error(transparent)]
    Common(#[from] radiogen_common::Error),
}
