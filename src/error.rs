use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for valrip-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    /// Commit and tag exist locally, but the push did not go through
    #[error("Release {tag} was committed ({commit}) and tagged locally, but not pushed to '{remote}'")]
    Unpublished {
        tag: String,
        commit: String,
        branch: String,
        remote: String,
        #[source]
        source: Box<ReleaseError>,
    },

    #[error("Patch failed for {path}: {reason}")]
    Patch { path: PathBuf, reason: String },

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Repository state error: {0}")]
    State(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in valrip-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        ReleaseError::Tag(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Create a patch error for a specific file
    pub fn patch(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ReleaseError::Patch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn artifact(msg: impl Into<String>) -> Self {
        ReleaseError::Artifact(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        ReleaseError::State(msg.into())
    }
}
