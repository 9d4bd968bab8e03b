//! # Observability & Tracing
//!
//! Structured logging for template preparation and request handling.
//!
//! ## Overview
//!
//! The library only emits events through the `tracing` macros. Installing a subscriber is
//! the host's job; [`setup_tracing`] is the one the demo binary uses.
//!
//! ## Verbose Templates
//!
//! A template built with [`TemplateOptions::VERBOSE`](crate::config::TemplateOptions::VERBOSE)
//! reports its lifecycle ("Script loaded", "Template ready") at `info`. Without it the same
//! events are `debug`, so they stay available behind `RUST_LOG` without cluttering normal
//! output.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle of verbose templates, warnings for scripts that failed to load
//! RUST_LOG=info cargo run -- ./site
//!
//! # Every script, bundle and request
//! RUST_LOG=debug cargo run -- ./site
//!
//! # Filter to the loading engine
//! RUST_LOG=templatr::framework=debug cargo run -- ./site
//! ```
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=debug`**:
//!
//! ```text
//! DEBUG Barrier waiting pending=3
//! DEBUG Script resolved index=1 origin="inline" bytes=24
//! INFO  Script loaded index=1 origin="inline" pending=2
//! WARN  Remote script failed to load url=https://cdn.example.com/a.js error=...
//! INFO  Script loaded index=2 origin="remote" pending=0
//! DEBUG Bundle opened index=1 bundle=0
//! DEBUG Script merged index=2 bundle=0
//! INFO  Template ready bundles=1 scripts=3
//! DEBUG Serving bundle path="/script-0.js" index=0
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

/// Logs at `info` when `$enabled`, at `debug` otherwise.
macro_rules! verbose {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            ::tracing::info!($($arg)+)
        } else {
            ::tracing::debug!($($arg)+)
        }
    };
}

pub(crate) use verbose;
