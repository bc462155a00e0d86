//! radiogen - Radio Program Assembly Pipeline
//!
//! Reads a fully resolved build request from a JSON file, runs the assembly
//! pipeline, and prints the build result as JSON on stdout. Exit status is
//! non-zero when the build fails.

use anyhow::{Context, Result};
use clap::Parser;
use radiogen::{BuildRequest, Pipeline, PipelineConfig, PipelineEvent};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "radiogen", version, about = "Assemble and publish a radio program")]
struct Args {
    /// Path to the build request JSON file
    request: PathBuf,

    /// Optional TOML config file; environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("radiogen {}", env!("CARGO_PKG_VERSION"));

    let request_json = std::fs::read_to_string(&args.request)
        .with_context(|| format!("Failed to read request file {}", args.request.display()))?;
    let request: BuildRequest =
        serde_json::from_str(&request_json).context("Request file is not a valid build request")?;

    let config = PipelineConfig::load(args.config.as_deref())?;

    let (event_tx, mut event_rx) = mpsc::channel(32);
    let events = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                PipelineEvent::StageStarted { stage } => info!("Stage: {}", stage),
                PipelineEvent::PlaceholderSubstituted {
                    name,
                    duration_secs,
                } => warn!(name, duration_secs, "Substituted silence placeholder"),
                PipelineEvent::SegmentMixed { question_id } => {
                    info!(question_id, "Mixed question segment")
                }
                PipelineEvent::ProgramPublished { url } => info!(url, "Program published"),
                PipelineEvent::Completed { skipped } => info!(skipped, "Run complete"),
                PipelineEvent::Failed { message } => warn!(message, "Run failed"),
            }
        }
    });

    let pipeline = Pipeline::with_events(config, event_tx)?;
    let result = pipeline.run(&request).await;
    // Dropping the pipeline closes the event channel so the logger task ends
    drop(pipeline);
    events.await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
