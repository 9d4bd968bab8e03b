//! # Templatr
//!
//! > **Precompiled HTML templates with server-side scripts.**
//!
//! This crate turns an HTML template containing `<script>` tags into a reusable,
//! request-servable artifact. Every script the template references (inline, local file or
//! remote URL) is loaded exactly once at startup. After that, each request renders a fresh
//! copy of the document, runs the scripts against it and streams the HTML back. Listeners
//! can hold the response open until their asynchronous work finishes.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Load Once, Render Many
//! Template preparation is the only place shared state is written. It happens once, when
//! the last script resolves, and the result ([`PreparedTemplate`](lifecycle::PreparedTemplate))
//! is immutable afterwards. Requests clone what they need and never lock anything shared.
//!
//! ### Fan-out / Fan-in
//! Each script loads on its own Tokio task. Loader tasks report to a single
//! [`ScriptLoadBarrier`](framework::ScriptLoadBarrier) over a channel; the barrier owns all
//! script state, so its "are we done?" check needs no locks.
//!
//! ### Collaborators at the Edges
//! Reading files, fetching URLs, executing JavaScript and talking to the host's HTTP stack
//! are all traits in [`clients`]. The defaults use `tokio::fs` and `reqwest`; the script
//! engine defaults to running nothing.
//!
//! ## 🚀 Core Concepts
//!
//! ### Bundles
//! With [`TemplateOptions::MERGE_SCRIPTS`](config::TemplateOptions::MERGE_SCRIPTS), adjacent
//! client scripts are concatenated into numbered bundles and their tags are replaced by a
//! single `<script src="./script-N.js">`. Requests for `script-N.js` are answered with the
//! bundle text directly.
//!
//! ### Server-only Scripts
//! `<script runat="server">` is executed for every request but never reaches the client.
//!
//! ### Holding a Response
//! The instance-ready listener receives a [`ResponseHandle`](response::ResponseHandle).
//! Call `wait()` before starting asynchronous work and `done()` when it finishes; the
//! response is sent exactly once, after the last `done()`.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! Script sources and the load barrier.
//!
//! ### 2. The Data ([`model`], [`bundler`])
//! The owned document tree, bundles, and the merge planner.
//!
//! ### 3. The Orchestrator ([`lifecycle`])
//! - **Key items**: [`Template`](lifecycle::Template), [`TemplateBuilder`](lifecycle::TemplateBuilder),
//!   [`Middleware`](lifecycle::Middleware).
//!
//! ### 4. Per-request State ([`response`])
//! The wait counter and the response wrapper.
//!
//! ### 5. The Interface ([`clients`])
//! Seams to the file system, network, script engine and host response.
//!
//! ## 🚀 Quick Start
//!
//! ```ignore
//! let template = Template::builder(
//!     TemplateConfig::new("./site")
//!         .with_options(TemplateOptions::MERGE_SCRIPTS | TemplateOptions::REMOVE_WHITE_SPACE),
//! )
//! .on_instance_ready(|response| {
//!     response.wait();
//!     tokio::spawn(async move {
//!         // ... fetch data, then edit the document ...
//!         response.done();
//!     });
//! })
//! .build()?;
//!
//! template.ready().await?;
//! let (tx, rx) = tokio::sync::oneshot::channel();
//! template.middleware().handle(&request, tx, |_| {})?;
//! let html = rx.await?;
//! ```
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run -- ./site template.htm /some/path
//! ```

pub mod bundler;
pub mod clients;
pub mod config;
pub mod error;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod response;
