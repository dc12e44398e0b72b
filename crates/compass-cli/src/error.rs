//! Error handling for the compass CLI

use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Everything a command can fail with
#[derive(Error, Debug)]
pub enum CliError {
    /// Spike archive could not be written or read back
    #[error("spike archive: {0}")]
    Archive(#[from] compass_storage::StorageError),

    /// Network reset or stepping failed
    #[error("simulation: {0}")]
    Simulation(#[from] compass_runtime::RuntimeError),

    /// Experiment file or circuit construction failed
    #[error("experiment: {0}")]
    Experiment(#[from] compass_connectome::ConnectomeError),

    /// An output file could not be created
    #[error("cannot write {}: {source}", .path.display())]
    Output {
        /// File that could not be created
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// Other I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Trace or summary JSON could not be encoded
    #[error("JSON output: {0}")]
    Json(#[from] serde_json::Error),

    /// Terminal setup, e.g. an invalid progress bar template
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// Flags that do not fit the experiment or archive
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Experiment or archive file that does not exist
    #[error("{0} not found")]
    MissingResource(String),
}

impl CliError {
    /// Failure to create `path`
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid arguments error
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    /// Create a missing resource error
    pub fn missing_resource(msg: impl Into<String>) -> Self {
        Self::MissingResource(msg.into())
    }
}
