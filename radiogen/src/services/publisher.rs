//! Publishing to the storage origin
//!
//! Uploads are PUT transfers under a deterministic path convention:
//! `{origin}/{category}/{world}/{file}`. Program file names carry a
//! millisecond timestamp so rebuilds of the same program never collide; the
//! manifest name is stable and overwritten on every successful build.

use crate::config::PipelineConfig;
use crate::manifest::{self, Manifest};
use chrono::Utc;
use radiogen_common::retry::{linear_backoff, retry};
use radiogen_common::Result;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// A successfully uploaded artifact.
#[derive(Debug, Clone)]
pub struct PublishedFile {
    /// Public URL the artifact is reachable at
    pub url: String,
    pub file_name: String,
    pub size: u64,
}

/// Uploads program audio and manifests to the storage origin.
#[derive(Debug, Clone)]
pub struct Publisher {
    client: reqwest::Client,
    origin_url: String,
    public_url: String,
    category: String,
    auth_token: Option<String>,
    max_retries: u32,
}

impl Publisher {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            origin_url: config.origin_url.trim_end_matches('/').to_string(),
            public_url: config.public_base().trim_end_matches('/').to_string(),
            category: config.category.clone(),
            auth_token: config.auth_token.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Timestamped program file name; unique across rebuilds.
    pub fn program_file_name(world: &str, lmid: u32) -> String {
        format!(
            "radio-program-{}-{}-{}.mp3",
            world,
            lmid,
            Utc::now().timestamp_millis()
        )
    }

    /// Public URL of an object under this publisher's path convention.
    pub fn public_url_for(&self, world: &str, file_name: &str) -> String {
        format!("{}/{}/{}/{}", self.public_url, self.category, world, file_name)
    }

    /// Public URL the manifest for a program is read from and written to.
    pub fn manifest_url(&self, world: &str, lmid: u32) -> String {
        self.public_url_for(world, &manifest::manifest_file_name(world, lmid))
    }

    /// Upload the final program audio.
    pub async fn publish_program(
        &self,
        local_path: &Path,
        world: &str,
        lmid: u32,
    ) -> Result<PublishedFile> {
        let file_name = Self::program_file_name(world, lmid);
        let bytes = tokio::fs::read(local_path).await?;
        let size = bytes.len() as u64;

        self.put(world, &file_name, bytes, "audio/mpeg").await?;

        let url = self.public_url_for(world, &file_name);
        info!(url, size, "Published program audio");

        Ok(PublishedFile {
            url,
            file_name,
            size,
        })
    }

    /// Upload the build manifest alongside the audio.
    pub async fn publish_manifest(&self, manifest: &Manifest) -> Result<PublishedFile> {
        let file_name = manifest::manifest_file_name(&manifest.world, manifest.lmid);
        let bytes = serde_json::to_vec_pretty(manifest)?;
        let size = bytes.len() as u64;

        self.put(&manifest.world, &file_name, bytes, "application/json")
            .await?;

        let url = self.public_url_for(&manifest.world, &file_name);
        info!(url, size, "Published manifest");

        Ok(PublishedFile {
            url,
            file_name,
            size,
        })
    }

    async fn put(
        &self,
        world: &str,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let target = format!(
            "{}/{}/{}/{}",
            self.origin_url, self.category, world, file_name
        );

        retry(
            &format!("upload {}", file_name),
            self.max_retries,
            linear_backoff(Duration::from_millis(1000)),
            || async {
                let mut request = self
                    .client
                    .put(&target)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(bytes.clone());

                if let Some(token) = &self.auth_token {
                    request = request.bearer_auth(token);
                }

                request.send().await?.error_for_status()?;
                Ok(())
            },
        )
        .await
    }
}
