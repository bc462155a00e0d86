//! Run-scoped temporary workspace
//!
//! Every pipeline run owns exactly one workspace directory holding all
//! downloaded and intermediate files. No other run may read or write into
//! it. The directory is removed on every exit path: `close` on the normal
//! path, `Drop` if the run unwinds.

use radiogen_common::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Exclusively-owned scratch directory for one pipeline run.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("radiogen-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Destination for a single or silence segment.
    pub fn segment_file(&self, index: usize, name: &str) -> PathBuf {
        self.dir
            .path()
            .join(format!("segment-{:02}-{}.mp3", index, sanitize(name)))
    }

    /// Destination for one answer clip of a combine segment.
    pub fn answer_file(&self, segment_index: usize, answer_index: usize) -> PathBuf {
        self.dir.path().join(format!(
            "segment-{:02}-answer-{:02}.mp3",
            segment_index, answer_index
        ))
    }

    /// Destination for the background loop of a combine segment.
    pub fn background_file(&self, segment_index: usize) -> PathBuf {
        self.dir
            .path()
            .join(format!("segment-{:02}-background.mp3", segment_index))
    }

    /// Output of the mixer for a combine segment.
    pub fn mixed_file(&self, segment_index: usize) -> PathBuf {
        self.dir
            .path()
            .join(format!("segment-{:02}-mixed.mp3", segment_index))
    }

    /// Output of the assembler.
    pub fn program_file(&self) -> PathBuf {
        self.dir.path().join("program.mp3")
    }

    /// Remove the directory and everything in it, reporting errors.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// Segment names come from request data; keep them filesystem-safe.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
