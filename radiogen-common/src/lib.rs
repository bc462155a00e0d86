//! # Radiogen Common Library
//!
//! Shared code for the radiogen pipeline:
//! - Error types
//! - Retry combinator for fallible network operations
//! - Configuration loading helpers
//! - Fade curve definitions and calculations

pub mod config;
pub mod error;
pub mod fade;
pub mod retry;

pub use error::{Error, Result};
pub use fade::FadeCurve;
