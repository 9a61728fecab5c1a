//! Error types for Stlscope geometry

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing meshes
#[derive(Error, Debug)]
pub enum Error {
    /// The file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file extension is not a mesh format we can read
    #[error("Unsupported mesh format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The file contents could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
