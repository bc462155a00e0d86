//! Remote file acquisition
//!
//! Streams a URL to local storage with bounded retries and a per-download
//! timeout, then normalizes the file to the canonical encoding so every
//! downstream stage sees a single uniform format regardless of what the
//! recording device produced.

use crate::audio::{decode, AudioClip};
use futures::StreamExt;
use radiogen_common::retry::{linear_backoff, retry};
use radiogen_common::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Downloads remote assets into the run workspace.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
    max_retries: u32,
}

impl RemoteFetcher {
    /// Create a fetcher with the given per-download timeout and retry budget.
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            max_retries,
        })
    }

    /// Shared HTTP client, reused for manifest reads.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Download `url` to `dest` and normalize it to the canonical encoding.
    ///
    /// On success exactly one canonical-format file exists at `dest`; on
    /// failure no file is left behind. A 404 surfaces as
    /// [`Error::NotFound`] without retries so the caller can decide whether
    /// the asset is silence-eligible.
    pub async fn fetch_canonical(&self, url: &str, dest: &Path) -> Result<()> {
        let outcome = self.fetch_and_normalize(url, dest).await;

        if outcome.is_err() && dest.exists() {
            // Leave no partial file behind
            let _ = std::fs::remove_file(dest);
        }

        outcome
    }

    async fn fetch_and_normalize(&self, url: &str, dest: &Path) -> Result<()> {
        retry(
            &format!("download {}", url),
            self.max_retries,
            linear_backoff(Duration::from_millis(1000)),
            || self.fetch_once(url, dest),
        )
        .await?;

        // Transcoding is CPU-bound; keep it off the async workers so parallel
        // downloads are not serialized behind it
        let path = dest.to_path_buf();
        tokio::task::spawn_blocking(move || normalize_to_canonical(&path))
            .await
            .map_err(|e| Error::Internal(format!("Transcode worker panicked: {}", e)))?
    }

    async fn fetch_once(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.to_string()));
        }
        let response = response.error_for_status()?;

        let total_bytes = response.content_length();
        let mut stream = response.bytes_stream();
        let mut file = tokio::fs::File::create(dest).await?;
        let mut received: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            received += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        match total_bytes {
            Some(total) => debug!(url, received, total, "Download complete"),
            None => debug!(url, received, "Download complete (no content-length)"),
        }

        Ok(())
    }
}

/// Re-encode a file in place unless it is already canonical MP3.
///
/// The probe is cheap; the transcode (decode, resample, re-encode) only runs
/// for files that need it.
pub fn normalize_to_canonical(path: &Path) -> Result<()> {
    match decode::probe_file(path) {
        Ok(probe) if probe.is_canonical() => {
            debug!(path = %path.display(), "File already canonical, skipping transcode");
            return Ok(());
        }
        Ok(probe) => {
            info!(
                path = %path.display(),
                is_mp3 = probe.is_mp3,
                sample_rate = ?probe.sample_rate,
                channels = ?probe.channels,
                "Transcoding to canonical encoding"
            );
        }
        // Unprobeable container; let the decoder produce the real error
        Err(e) => debug!(path = %path.display(), error = %e, "Probe failed, attempting decode"),
    }

    let clip = AudioClip::load(path)?;
    clip.save(path)
}
