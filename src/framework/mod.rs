//! Script loading engine.
//!
//! This module provides the fan-out/fan-in machinery that turns a template's script tags
//! into loaded content.
//!
//! # Main Components
//!
//! - [`ScriptSource`] - One script tag: origin, server-only flag, position, loaded content
//! - [`ScriptLoadBarrier`] - Owns the sources and fires once when all of them resolved
//! - [`ScriptLoaded`] - Notification a loader task sends to the barrier
//!
//! # Testing
//!
//! See [`mock`] for a network stand-in with expectation tracking.

pub mod barrier;
pub mod mock;
pub mod source;

pub use barrier::*;
pub use source::*;
