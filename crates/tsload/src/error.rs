//! Error types for tsload.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while acquiring or normalizing a data set.
///
/// Nothing is caught or retried internally; every failure aborts the current
/// load call and carries enough context (identifier, path or record index) to
/// diagnose it.
#[derive(Error, Debug)]
pub enum DataError {
    /// Remote location unreachable or returned a non-success status.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Corrupt or undecodable archive.
    #[error("Archive error: {0}")]
    Archive(String),

    /// A structured file violates its expected field layout.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Incompatible array shapes in one collection.
    #[error("Shape error: {0}")]
    Shape(String),

    /// An expected file is absent from a populated-looking cache directory.
    ///
    /// Cache population is not atomic; an interrupted fetch leaves a
    /// directory that reads as cached. Delete it and fetch again.
    #[error("Missing file: {}", .0.display())]
    MissingFile(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
