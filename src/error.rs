//! Error types for scrapestack operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while learning rules or loading/saving a model.
///
/// Structural mismatches during matching are not errors: a rule that finds
/// nothing in a document simply contributes no values.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller contract violation (no targets, ratio outside [0, 1], ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Model file does not exist.
    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    /// Model file exists but does not contain a valid rule set.
    #[error("malformed model data: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
