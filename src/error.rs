use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for cldr operations
#[derive(Error, Debug)]
pub enum CldrError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Changelog structure error: {0}")]
    DocumentStructure(String),

    #[error("The changelog directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error(
        "No bullets found: no markdown files (not including README.md) exist in {}",
        .0.display()
    )]
    NoBulletsFound(PathBuf),

    #[error("Usage error: {0}")]
    Usage(String),

    /// A bullet line could not be parsed; the underlying cause is the source.
    #[error("There was a problem parsing one of the changelog bullets: {line:?}")]
    InvalidBullet {
        line: String,
        #[source]
        source: Box<CldrError>,
    },

    #[error("Commit lookup failed: {0}")]
    CommitLookup(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Results in cldr
pub type Result<T> = std::result::Result<T, CldrError>;

impl CldrError {
    /// Create a parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        CldrError::Parse(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        CldrError::Config(msg.into())
    }

    /// Create a changelog document structure error with context
    pub fn document(msg: impl Into<String>) -> Self {
        CldrError::DocumentStructure(msg.into())
    }

    /// Create a usage error with context
    pub fn usage(msg: impl Into<String>) -> Self {
        CldrError::Usage(msg.into())
    }

    /// Create a commit lookup error with context
    pub fn commit_lookup(msg: impl Into<String>) -> Self {
        CldrError::CommitLookup(msg.into())
    }

    /// Attach the offending raw bullet line to a parse failure
    pub fn invalid_bullet(line: impl Into<String>, source: CldrError) -> Self {
        CldrError::InvalidBullet {
            line: line.into(),
            source: Box::new(source),
        }
    }
}
