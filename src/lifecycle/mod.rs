//! Template lifecycle and request handling.
//!
//! # Main Components
//!
//! - [`Template`] - Loads a template once, then renders it for every request
//! - [`TemplateBuilder`] - Wires collaborators and listeners before loading starts
//! - [`Middleware`] - The `(request, response, next)` entry point for host frameworks
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod middleware;
pub mod template;
pub mod tracing;

pub use middleware::*;
pub use template::*;
pub use self::tracing::setup_tracing;
pub(crate) use self::tracing::verbose;
