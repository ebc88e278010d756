//! Error types for the face PnP library.

use std::path::PathBuf;
use thiserror::Error;

/// Which side of a 3D/2D correspondence is missing a landmark index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrespondenceSide {
    /// The canonical 3D model has no vertex at the index
    Model,
    /// The ingested 2D frame landmarks have no point at the index
    Landmarks,
}

impl std::fmt::Display for CorrespondenceSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model => f.write_str("canonical 3D model"),
            Self::Landmarks => f.write_str("frame 2D landmarks"),
        }
    }
}

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Canonical 3D model file missing, unreadable or malformed
    #[error("Failed to load canonical model {}: {reason}", path.display())]
    ModelLoad {
        /// Path of the model file (or `<memory>` for in-memory parsing)
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// A configured landmark index has no counterpart on one side
    #[error("Landmark index {index} is missing from the {side}")]
    MissingCorrespondence {
        /// The configured landmark index
        index: usize,
        /// Which map lacks it
        side: CorrespondenceSide,
    },

    /// Projection or angle extraction requested while no pose is available
    #[error("Pose unavailable: {0}")]
    PoseUnavailable(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `OpenCV` operation failed
    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
