//! Pipeline orchestration
//!
//! Drives one build request through the full stage sequence: change
//! detection, parallel asset download, per-question mixing, final assembly,
//! and publishing. The orchestrator owns stage ordering and failure policy;
//! the actual audio and transfer work lives in `services`.
//!
//! Failure policy in one place:
//! - missing system asset: substitute silence, keep going
//! - missing user recording: fatal
//! - manifest upload failure after the audio is live: log and keep going
//! - everything else: fatal, workspace cleaned up, manifest untouched

pub mod locks;
pub mod workspace;

pub use locks::BuildLocks;
pub use workspace::Workspace;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::manifest::{self, Manifest, ManifestSegment, MANIFEST_VERSION};
use crate::services::{assembler, mixer, silence, Publisher, RemoteFetcher};
use crate::types::{BuildRequest, BuildResult, Segment, SystemAsset};
use chrono::Utc;
use futures::future::{try_join, try_join_all};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Stages of one pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Checking,
    Downloading,
    Mixing,
    Assembling,
    Publishing,
    CleaningUp,
    Done,
    Failed,
}

impl BuildStage {
    pub fn label(&self) -> &'static str {
        match self {
            BuildStage::Checking => "CHECKING",
            BuildStage::Downloading => "DOWNLOADING",
            BuildStage::Mixing => "MIXING",
            BuildStage::Assembling => "ASSEMBLING",
            BuildStage::Publishing => "PUBLISHING",
            BuildStage::CleaningUp => "CLEANING_UP",
            BuildStage::Done => "DONE",
            BuildStage::Failed => "FAILED",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Progress notifications emitted during a run.
///
/// Delivery is best-effort: a full or closed channel drops the event rather
/// than stalling the build.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StageStarted { stage: BuildStage },
    /// A missing system asset was replaced with silence
    PlaceholderSubstituted { name: String, duration_secs: f64 },
    SegmentMixed { question_id: String },
    ProgramPublished { url: String },
    Completed { skipped: bool },
    Failed { message: String },
}

/// Whether a segment's primary assets are owned by the system.
///
/// System assets are replaceable with silence when missing; user recordings
/// are not. Combine segments are classified by their answers (user content);
/// their background loop is handled separately as a system asset.
pub fn is_system_asset(segment: &Segment) -> bool {
    match segment {
        Segment::Single { .. } | Segment::Silence { .. } => true,
        Segment::CombineWithBackground { .. } => false,
    }
}

/// A downloaded segment awaiting further processing.
enum StagedSegment {
    /// Already a single playable file
    Ready(PathBuf),
    /// Needs the mixing stage
    Mix {
        question_id: String,
        answers: Vec<PathBuf>,
        background: PathBuf,
    },
}

/// One pipeline instance; cheap to share across requests.
pub struct Pipeline {
    config: PipelineConfig,
    fetcher: RemoteFetcher,
    publisher: Publisher,
    locks: BuildLocks,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> radiogen_common::Result<Self> {
        config.validate()?;
        let fetcher = RemoteFetcher::new(
            Duration::from_secs(config.download_timeout_secs),
            config.max_retries,
        )?;
        let publisher = Publisher::new(&config)?;

        Ok(Self {
            config,
            fetcher,
            publisher,
            locks: BuildLocks::new(),
            event_tx: None,
        })
    }

    /// Like [`Pipeline::new`], with progress events sent to `event_tx`.
    pub fn with_events(
        config: PipelineConfig,
        event_tx: mpsc::Sender<PipelineEvent>,
    ) -> radiogen_common::Result<Self> {
        let mut pipeline = Self::new(config)?;
        pipeline.event_tx = Some(event_tx);
        Ok(pipeline)
    }

    /// Run one build request to completion.
    ///
    /// Never panics or returns an error type; every outcome, including
    /// failure, is a [`BuildResult`].
    pub async fn run(&self, request: &BuildRequest) -> BuildResult {
        let started = Instant::now();
        info!(
            world = %request.world,
            lmid = request.lmid,
            language = %request.language,
            segments = request.segments.len(),
            recordings = request.recordings.len(),
            "Starting pipeline run"
        );

        // Serialize concurrent builds of the same program
        let _build_guard = self.locks.acquire(&request.world, request.lmid).await;

        self.emit(PipelineEvent::StageStarted {
            stage: BuildStage::Checking,
        });

        let current_count = request.recordings.len() as u32;
        let manifest_url = self.publisher.manifest_url(&request.world, request.lmid);
        let previous = manifest::fetch_previous(self.fetcher.client(), &manifest_url).await;

        if let Some(previous) = previous {
            if !manifest::needs_rebuild(current_count, Some(&previous)) {
                info!(
                    world = %request.world,
                    lmid = request.lmid,
                    recording_count = current_count,
                    "Recording count unchanged, reusing published program"
                );
                self.emit(PipelineEvent::Completed { skipped: true });
                return BuildResult {
                    success: true,
                    audio_url: Some(previous.program_url),
                    duration_secs: None,
                    processing_time_ms: started.elapsed().as_millis() as u64,
                    segment_count: previous.segment_count,
                    skipped: true,
                    error: None,
                };
            }
        }

        let workspace = match Workspace::create() {
            Ok(ws) => ws,
            Err(e) => return self.failed(started, request, PipelineError::Common(e)),
        };

        let outcome = self
            .execute(&workspace, request, current_count, started)
            .await;

        self.emit(PipelineEvent::StageStarted {
            stage: BuildStage::CleaningUp,
        });
        if let Err(e) = workspace.close() {
            warn!(error = %e, "Workspace cleanup failed");
        }

        match outcome {
            Ok(result) => {
                info!(
                    world = %request.world,
                    lmid = request.lmid,
                    duration_secs = result.duration_secs,
                    processing_time_ms = result.processing_time_ms,
                    "Pipeline run complete"
                );
                self.emit(PipelineEvent::Completed { skipped: false });
                result
            }
            Err(e) => self.failed(started, request, e),
        }
    }

    /// Everything between workspace creation and cleanup.
    async fn execute(
        &self,
        workspace: &Workspace,
        request: &BuildRequest,
        current_count: u32,
        started: Instant,
    ) -> PipelineResult<BuildResult> {
        self.emit(PipelineEvent::StageStarted {
            stage: BuildStage::Downloading,
        });
        let staged = self.download_all(workspace, request).await?;

        self.emit(PipelineEvent::StageStarted {
            stage: BuildStage::Mixing,
        });
        let mut processed = Vec::with_capacity(staged.len());
        for (index, segment) in staged.into_iter().enumerate() {
            match segment {
                StagedSegment::Ready(path) => processed.push(path),
                StagedSegment::Mix {
                    question_id,
                    answers,
                    background,
                } => {
                    let output = workspace.mixed_file(index);
                    let crossfade = self.crossfade();
                    let background_gain = self.config.background_gain;
                    let worker_output = output.clone();

                    // Sample mixing is CPU-bound; keep it off the async workers
                    let mixed = tokio::task::spawn_blocking(move || {
                        mixer::combine(
                            &answers,
                            &background,
                            &worker_output,
                            crossfade,
                            background_gain,
                        )
                    })
                    .await;

                    match mixed {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            return Err(PipelineError::Mix {
                                question_id,
                                message: e.to_string(),
                            })
                        }
                        Err(e) => {
                            return Err(PipelineError::Mix {
                                question_id,
                                message: format!("Mix worker panicked: {}", e),
                            })
                        }
                    }

                    self.emit(PipelineEvent::SegmentMixed { question_id });
                    processed.push(output);
                }
            }
        }

        self.emit(PipelineEvent::StageStarted {
            stage: BuildStage::Assembling,
        });
        let program_path = workspace.program_file();
        let title = request.program_title();
        let crossfade = self.crossfade();
        let worker_path = program_path.clone();
        let assembled = tokio::task::spawn_blocking(move || {
            assembler::assemble(&processed, &worker_path, &title, crossfade)
        })
        .await
        .map_err(|e| PipelineError::Assemble(format!("Assembly worker panicked: {}", e)))?
        .map_err(|e| PipelineError::Assemble(e.to_string()))?;

        self.emit(PipelineEvent::StageStarted {
            stage: BuildStage::Publishing,
        });
        let published = self
            .publisher
            .publish_program(&program_path, &request.world, request.lmid)
            .await
            .map_err(|e| PipelineError::Publish(e.to_string()))?;
        self.emit(PipelineEvent::ProgramPublished {
            url: published.url.clone(),
        });

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            generated_at: Utc::now(),
            world: request.world.clone(),
            lmid: request.lmid,
            program_url: published.url.clone(),
            file_name: published.file_name.clone(),
            file_size: published.size,
            processing_time: started.elapsed().as_millis() as u64,
            segment_count: request.segments.len(),
            recording_count: Some(current_count),
            segments: request
                .segments
                .iter()
                .enumerate()
                .map(|(index, segment)| ManifestSegment {
                    index,
                    kind: segment.kind().to_string(),
                    question_id: segment.question_id().map(str::to_string),
                    answer_count: segment.answer_count(),
                })
                .collect(),
        };

        // The audio artifact is already live; a lost manifest only costs one
        // redundant rebuild next run
        if let Err(e) = self.publisher.publish_manifest(&manifest).await {
            warn!(error = %e, "Manifest publish failed, audio remains published");
        }

        Ok(BuildResult {
            success: true,
            audio_url: Some(published.url),
            duration_secs: Some(assembled.duration_secs),
            processing_time_ms: started.elapsed().as_millis() as u64,
            segment_count: request.segments.len(),
            skipped: false,
            error: None,
        })
    }

    /// Resolve every segment to local files, downloading in parallel.
    async fn download_all(
        &self,
        workspace: &Workspace,
        request: &BuildRequest,
    ) -> PipelineResult<Vec<StagedSegment>> {
        let jobs = request
            .segments
            .iter()
            .enumerate()
            .map(|(index, segment)| self.download_segment(workspace, index, segment));
        try_join_all(jobs).await
    }

    async fn download_segment(
        &self,
        workspace: &Workspace,
        index: usize,
        segment: &Segment,
    ) -> PipelineResult<StagedSegment> {
        match segment {
            Segment::Single { name, url, asset } => {
                let dest = workspace.segment_file(index, name);
                self.fetch_primary(segment, url, &dest, Some(*asset), name)
                    .await?;
                Ok(StagedSegment::Ready(dest))
            }
            Segment::CombineWithBackground {
                question_id,
                answers,
                background_url,
            } => {
                if answers.is_empty() {
                    return Err(PipelineError::Mix {
                        question_id: question_id.clone(),
                        message: "segment has no answer recordings".to_string(),
                    });
                }

                let answer_jobs = answers.iter().enumerate().map(|(answer_index, recording)| {
                    let dest = workspace.answer_file(index, answer_index);
                    async move {
                        self.fetch_primary(segment, &recording.url, &dest, None, &recording.filename)
                            .await?;
                        Ok::<PathBuf, PipelineError>(dest)
                    }
                });

                // The background loop is a system asset regardless of the
                // segment's (user) classification
                let background = workspace.background_file(index);
                let background_job = self.fetch_system(
                    background_url,
                    &background,
                    SystemAsset::Background,
                    "background",
                );

                let (answer_paths, _) =
                    try_join(try_join_all(answer_jobs), background_job).await?;

                Ok(StagedSegment::Mix {
                    question_id: question_id.clone(),
                    answers: answer_paths,
                    background,
                })
            }
            Segment::Silence { duration_secs } => {
                let dest = workspace.segment_file(index, "silence");
                generate_silence_blocking(dest.clone(), *duration_secs).await?;
                Ok(StagedSegment::Ready(dest))
            }
        }
    }

    /// Fetch one of a segment's primary assets.
    ///
    /// The missing-asset policy follows [`is_system_asset`]: system-owned
    /// segments fall back to a silent placeholder of the `placeholder` class,
    /// user content is fatal when missing.
    async fn fetch_primary(
        &self,
        segment: &Segment,
        url: &str,
        dest: &Path,
        placeholder: Option<SystemAsset>,
        name: &str,
    ) -> PipelineResult<()> {
        match (is_system_asset(segment), placeholder) {
            (true, Some(asset)) => self.fetch_system(url, dest, asset, name).await,
            _ => self.fetch_user(url, dest).await,
        }
    }

    /// Fetch a system asset, substituting silence if it does not exist.
    async fn fetch_system(
        &self,
        url: &str,
        dest: &Path,
        asset: SystemAsset,
        name: &str,
    ) -> PipelineResult<()> {
        match self.fetcher.fetch_canonical(url, dest).await {
            Ok(()) => Ok(()),
            Err(radiogen_common::Error::NotFound(_)) => {
                let duration_secs = asset.default_silence_secs();
                warn!(
                    url,
                    asset = asset.label(),
                    duration_secs,
                    "System asset missing, substituting silence"
                );
                generate_silence_blocking(dest.to_path_buf(), duration_secs).await?;
                self.emit(PipelineEvent::PlaceholderSubstituted {
                    name: name.to_string(),
                    duration_secs,
                });
                Ok(())
            }
            Err(source) => Err(PipelineError::Download {
                url: url.to_string(),
                source,
            }),
        }
    }

    /// Fetch a user recording. Missing user content is always fatal.
    async fn fetch_user(&self, url: &str, dest: &Path) -> PipelineResult<()> {
        match self.fetcher.fetch_canonical(url, dest).await {
            Ok(()) => Ok(()),
            Err(radiogen_common::Error::NotFound(_)) => Err(PipelineError::MissingUserAsset {
                url: url.to_string(),
            }),
            Err(source) => Err(PipelineError::Download {
                url: url.to_string(),
                source,
            }),
        }
    }

    fn failed(
        &self,
        started: Instant,
        request: &BuildRequest,
        error: PipelineError,
    ) -> BuildResult {
        error!(
            world = %request.world,
            lmid = request.lmid,
            error = %error,
            "Pipeline run failed"
        );
        self.emit(PipelineEvent::Failed {
            message: error.to_string(),
        });

        BuildResult {
            success: false,
            audio_url: None,
            duration_secs: None,
            processing_time_ms: started.elapsed().as_millis() as u64,
            segment_count: request.segments.len(),
            skipped: false,
            error: Some(error.to_string()),
        }
    }

    fn crossfade(&self) -> Duration {
        Duration::from_millis(self.config.crossfade_ms)
    }

    /// Best-effort event delivery: a saturated or closed channel drops the
    /// event so progress reporting can never stall the build.
    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.try_send(event);
        }
    }
}

/// Placeholder synthesis encodes MP3; run it on the blocking pool.
async fn generate_silence_blocking(path: PathBuf, duration_secs: f64) -> PipelineResult<()> {
    tokio::task::spawn_blocking(move || silence::generate_silence(&path, duration_secs))
        .await
        .map_err(|e| {
            PipelineError::Common(radiogen_common::Error::Internal(format!(
                "Placeholder worker panicked: {}",
                e
            )))
        })?
        .map_err(PipelineError::Common)
}
