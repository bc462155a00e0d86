//! radiogen - Radio Program Assembly Pipeline
//!
//! Assembles a personalized multi-segment radio program from user-submitted
//! voice recordings, static narration clips, and background music, then
//! publishes the result plus a JSON manifest to a storage origin.
//!
//! The pipeline is a library; the `radiogen` binary wraps it with a CLI that
//! accepts a fully resolved build request. Identity, CRM, and asset-naming
//! layers live in external collaborators and hand the pipeline its inputs.

pub mod audio;
pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod services;
pub mod types;

pub use crate::config::PipelineConfig;
pub use crate::error::{PipelineError, PipelineResult};
pub use crate::manifest::{needs_rebuild, Manifest, ManifestSegment};
pub use crate::pipeline::{BuildStage, Pipeline, PipelineEvent};
pub use crate::types::{BuildRequest, BuildResult, Recording, Segment, SystemAsset};
