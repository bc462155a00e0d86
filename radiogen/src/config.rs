//! Pipeline configuration
//!
//! Resolution priority: environment variables override TOML file values,
//! which override compiled defaults. Only the storage origin URL is
//! mandatory; everything else has a sensible default.

use radiogen_common::{config as common_config, Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration for one pipeline instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Storage origin base URL; PUT targets are `{origin_url}/{category}/{world}/{file}`
    pub origin_url: String,
    /// Public base URL for playback and manifest reads; falls back to `origin_url`
    pub public_url: Option<String>,
    /// Top-level category path component under which programs are stored
    pub category: String,
    /// Bearer token sent with uploads, when the origin requires one
    pub auth_token: Option<String>,
    /// Per-download timeout in seconds
    pub download_timeout_secs: u64,
    /// Attempts per network transfer (downloads and uploads)
    pub max_retries: u32,
    /// Crossfade duration between clips, in milliseconds
    pub crossfade_ms: u64,
    /// Volume scale applied to the background track during mixing
    pub background_gain: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            origin_url: String::new(),
            public_url: None,
            category: "radio".to_string(),
            auth_token: None,
            download_timeout_secs: 30,
            max_retries: 3,
            crossfade_ms: 1000,
            background_gain: 0.1,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from an optional TOML file with env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                info!("Loading config from {}", p.display());
                common_config::load_toml::<PipelineConfig>(p)?
            }
            None => PipelineConfig::default(),
        };

        if let Some(origin) = common_config::resolve_setting(None, "RADIOGEN_ORIGIN_URL") {
            config.origin_url = origin;
        }
        if let Some(public) = common_config::resolve_setting(None, "RADIOGEN_PUBLIC_URL") {
            config.public_url = Some(public);
        }
        if let Some(category) = common_config::resolve_setting(None, "RADIOGEN_CATEGORY") {
            config.category = category;
        }
        if let Some(token) = common_config::resolve_setting(None, "RADIOGEN_AUTH_TOKEN") {
            config.auth_token = Some(token);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.origin_url.is_empty() {
            return Err(Error::Config(
                "origin_url is not configured; set it in the config file or RADIOGEN_ORIGIN_URL"
                    .to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(Error::Config("max_retries must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.background_gain) {
            return Err(Error::Config(format!(
                "background_gain must be within 0.0..=1.0, got {}",
                self.background_gain
            )));
        }
        Ok(())
    }

    /// Base URL used for public playback and manifest reads.
    pub fn public_base(&self) -> &str {
        self.public_url.as_deref().unwrap_or(&self.origin_url)
    }
}
