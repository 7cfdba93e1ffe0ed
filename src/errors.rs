//! Crate-level error type
//!
//! Extraction, batch processing, configuration and the commands all report
//! through `PatchError`, which wraps the codec, store and session errors.

use std::fmt;
use std::io;

use crate::annotation::errors::{SessionError, StoreError};
use crate::tiff::errors::TiffError;

/// Errors raised outside a single codec or store operation
#[derive(Debug)]
pub enum PatchError {
    /// Filesystem failure
    Io(io::Error),
    /// Volume read or write failure
    Tiff(TiffError),
    /// Annotation store failure
    Store(StoreError),
    /// Session transition refused
    Session(SessionError),
    /// PNG preview encoding failure
    Image(image::ImageError),
    /// Invalid configuration value, naming the key
    Config(String),
    /// Invalid argument or input layout
    InvalidInput(String),
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::Io(e) => write!(f, "I/O error: {}", e),
            PatchError::Tiff(e) => write!(f, "{}", e),
            PatchError::Store(e) => write!(f, "{}", e),
            PatchError::Session(e) => write!(f, "{}", e),
            PatchError::Image(e) => write!(f, "Image error: {}", e),
            PatchError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PatchError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for PatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PatchError::Io(e) => Some(e),
            PatchError::Tiff(e) => Some(e),
            PatchError::Store(e) => Some(e),
            PatchError::Session(e) => Some(e),
            PatchError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PatchError {
    fn from(error: io::Error) -> Self {
        PatchError::Io(error)
    }
}

impl From<TiffError> for PatchError {
    fn from(error: TiffError) -> Self {
        PatchError::Tiff(error)
    }
}

impl From<StoreError> for PatchError {
    fn from(error: StoreError) -> Self {
        PatchError::Store(error)
    }
}

impl From<SessionError> for PatchError {
    fn from(error: SessionError) -> Self {
        PatchError::Session(error)
    }
}

impl From<image::ImageError> for PatchError {
    fn from(error: image::ImageError) -> Self {
        PatchError::Image(error)
    }
}

/// Result type for crate-level operations
pub type PatchResult<T> = Result<T, PatchError>;
