//! Errors surfaced by the stage.
//!
//! [`FileError`] is everything that can go wrong while processing one file.
//! [`ProcessError`] is what the stream reports: a per-file failure tagged with
//! the offending path, or the one fatal condition (unbuffered input).

use crate::imaging::{EngineError, GeometryError};
use crate::options::OptionsError;
use std::path::PathBuf;
use thiserror::Error;

/// A failure scoped to a single file.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] OptionsError),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{}: streaming contents are not supported, buffer the file first", path.display())]
    UnsupportedInput { path: PathBuf },
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: FileError,
    },
}

impl ProcessError {
    /// Whether the stream must stop after reporting this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProcessError::UnsupportedInput { .. })
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            ProcessError::UnsupportedInput { path } | ProcessError::File { path, .. } => path,
        }
    }
}
