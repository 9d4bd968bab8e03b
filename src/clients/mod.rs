//! Seams to the collaborators the core does not implement itself: file and network reads,
//! script execution, and the host framework's response object.

pub mod engine;
pub mod error;
pub mod fetch;
pub mod responder;

pub use engine::*;
pub use error::*;
pub use fetch::*;
pub use responder::HttpResponder;
pub(crate) use responder::{html_response, script_response};
