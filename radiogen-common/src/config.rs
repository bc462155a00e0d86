//! Configuration loading helpers
//!
//! Settings resolve in priority order: explicit value (CLI), environment
//! variable, TOML file, compiled default. The typed config structs live in
//! the crates that own them; this module provides the shared plumbing.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read a TOML file into a typed configuration struct.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Resolve a single string setting with explicit-over-environment priority.
///
/// Returns the explicit value when present, otherwise a non-empty
/// environment variable, otherwise `None`.
pub fn resolve_setting(explicit: Option<String>, env_var: &str) -> Option<String> {
    if let Some(value) = explicit {
        return Some(value);
    }

    match std::env::var(env_var) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}
