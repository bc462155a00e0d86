//! Pipeline service components
//!
//! Leaf components the orchestrator sequences: remote fetching, placeholder
//! synthesis, per-question mixing, final assembly, and publishing.

pub mod assembler;
pub mod fetcher;
pub mod mixer;
pub mod publisher;
pub mod silence;

pub use assembler::{assemble, AssembledProgram};
pub use fetcher::RemoteFetcher;
pub use publisher::{PublishedFile, Publisher};
pub use silence::generate_silence;
