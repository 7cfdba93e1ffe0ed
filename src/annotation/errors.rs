//! Error types for annotation storage and the annotation session

use std::fmt;
use std::io;

use crate::tiff::errors::TiffError;

/// Failures reading or writing an annotation store file
#[derive(Debug)]
pub enum StoreError {
    /// File could not be opened, read or written
    Io(io::Error),
    /// CSV layer failure, including opening the file
    Csv(csv::Error),
    /// Header row lacks a required column
    MissingColumn(&'static str),
    /// A row that cannot be turned into an annotation
    Corrupt { line: u64, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "Annotation store I/O error: {}", e),
            StoreError::Csv(e) => write!(f, "Annotation store is not valid CSV: {}", e),
            StoreError::MissingColumn(name) => write!(f, "Annotation store has no '{}' column", name),
            StoreError::Corrupt { line, reason } => {
                write!(f, "Corrupt annotation store at line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(error: io::Error) -> Self {
        StoreError::Io(error)
    }
}

impl From<csv::Error> for StoreError {
    fn from(error: csv::Error) -> Self {
        StoreError::Csv(error)
    }
}

/// Result type for annotation store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Transitions the annotation session refuses
#[derive(Debug)]
pub enum SessionError {
    /// Operation needs a loaded volume
    NoVolume,
    /// Confirmation requested without an unconfirmed point
    NoPendingPoint,
    /// Undo on an empty annotation list
    NothingToUndo,
    /// Click outside the displayed slice
    OutsideSlice { x: i64, y: i64, width: usize, height: usize },
    /// Selected file is not a 3-dimensional volume
    NotAVolume(String),
    /// Volume file could not be decoded
    Volume(TiffError),
    /// Annotation store could not be written
    Store(StoreError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoVolume => write!(f, "No volume loaded"),
            SessionError::NoPendingPoint => write!(f, "No unconfirmed point to label"),
            SessionError::NothingToUndo => write!(f, "No annotation to delete"),
            SessionError::OutsideSlice { x, y, width, height } => {
                write!(f, "Point ({}, {}) is outside the {}x{} slice", x, y, width, height)
            }
            SessionError::NotAVolume(reason) => {
                write!(f, "Selected file is not a 3D volume: {}", reason)
            }
            SessionError::Volume(e) => write!(f, "Could not read volume: {}", e),
            SessionError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Volume(e) => Some(e),
            SessionError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TiffError> for SessionError {
    fn from(error: TiffError) -> Self {
        SessionError::Volume(error)
    }
}

impl From<StoreError> for SessionError {
    fn from(error: StoreError) -> Self {
        SessionError::Store(error)
    }
}

/// Result type for session transitions
pub type SessionResult<T> = Result<T, SessionError>;
