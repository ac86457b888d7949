//! Common error types used throughout clearcut.
//!
//! This module provides a unified error type covering the failure cases the
//! service can hit: bad uploads, pipeline/adapter failures, metadata write
//! failures, and unknown ids.

/// Common error type for clearcut.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested image was not found.
    #[error("Image not found: {0}")]
    NotFound(String),

    /// Invalid input was provided (missing or non-image upload).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The pipeline or adapter failed fatally (undecodable image, write error).
    #[error("Processing failed: {0}")]
    Processing(String),

    /// Writing the metadata collection failed.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Processing error.
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new Persistence error.
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        Self::Persistence(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
