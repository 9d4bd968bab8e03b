//! Error types for the external collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// A single script failed to load.
///
/// Load failures never escape a [`ScriptSource`](crate::framework::ScriptSource): they are
/// logged and the script resolves with empty content.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The local script file could not be read.
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote script could not be fetched, or the server answered with an error status.
    #[error("failed to fetch remote script: {0}")]
    Http(#[from] reqwest::Error),

    /// The collaborator refused the request outright.
    #[error("script unavailable: {0}")]
    Unavailable(String),
}

/// Running a script against a request's document failed.
///
/// Fatal to that request only; the prepared template is never touched.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    /// The script raised an error.
    #[error("script error: {message}")]
    Script { message: String },
}

impl From<String> for ExecutionError {
    fn from(message: String) -> Self {
        ExecutionError::Script { message }
    }
}
