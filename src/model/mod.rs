//! Data owned by a template: the document tree and its script bundles.

pub mod bundle;
pub mod document;

pub use bundle::*;
pub use document::*;
