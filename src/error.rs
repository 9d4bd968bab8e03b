//! Error types for template construction and request handling.

use crate::clients::ExecutionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the host.
///
/// Script load failures are not here: they are recovered inside the loader and never
/// reach the caller.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template file could not be read. Raised while building, so no half-built
    /// template ever exists.
    #[error("template not found at {path}")]
    TemplateNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A script failed while rendering one request.
    #[error("request execution failed")]
    Execution(#[from] ExecutionError),

    /// Loading stopped before every script resolved, so the template will never be ready.
    #[error("template loading was abandoned before it became ready")]
    Abandoned,
}
