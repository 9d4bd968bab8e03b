//! The script execution seam.
//!
//! Executing JavaScript is outside this crate. A [`ScriptEngine`] receives the request's
//! document (with its location already set) and one script's text, and may mutate the
//! document however it likes.

use crate::clients::ExecutionError;
use crate::model::Document;

/// Runs script text against a document.
pub trait ScriptEngine: Send + Sync {
    fn execute(&self, document: &mut Document, script: &str) -> Result<(), ExecutionError>;
}

/// Engine that runs nothing. The served document is the prepared markup as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEngine;

impl ScriptEngine for NoopEngine {
    fn execute(&self, _document: &mut Document, _script: &str) -> Result<(), ExecutionError> {
        Ok(())
    }
}

impl<F> ScriptEngine for F
where
    F: Fn(&mut Document, &str) -> Result<(), ExecutionError> + Send + Sync,
{
    fn execute(&self, document: &mut Document, script: &str) -> Result<(), ExecutionError> {
        self(document, script)
    }
}
