//! Error types for the chamber.
//!
//! The per-frame step never fails. Errors only surface at the edges:
//! validating a configuration once at startup, loading it from disk, and
//! exporting the trail image.

use std::io;
use thiserror::Error;

/// Errors that can occur while building or persisting a simulation.
#[derive(Debug, Error)]
pub enum ChamberError {
    /// A configuration value violates a startup precondition.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse a JSON configuration.
    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to encode the trail image.
    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChamberError>;
