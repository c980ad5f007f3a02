//! Error taxonomy for the build/match pipeline

use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors raised by pipeline components
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    ProcessFailed { program: String, status: ExitStatus },

    #[error("no engine binary found in {} (looked for {candidates:?})", .build_dir.display())]
    BinaryNotFound {
        build_dir: PathBuf,
        candidates: Vec<String>,
    },

    #[error("staged engines must share a directory: {} vs {}", .0.display(), .1.display())]
    StagingMismatch(PathBuf, PathBuf),

    #[error("invalid match configuration: {0}")]
    InvalidMatchConfig(String),

    #[error("revision must not be empty")]
    EmptyRevision,

    #[error("unknown build type `{0}` (expected debug, release, relwithdebinfo or minsizerel)")]
    InvalidBuildConfig(String),

    #[error("invalid configuration file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid run manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error(transparent)]
    Annotate(#[from] result_annotator::AnnotateError),
}

impl Error {
    /// Wrap an I/O failure with the path it concerns
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
