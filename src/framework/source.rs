//! # Script Sources
//!
//! One [`ScriptSource`] per `<script>` tag, created in document order when the template is
//! parsed. A source knows where its content comes from ([`ScriptOrigin`]) and resolves it
//! exactly once through [`ScriptSource::resolve`], which spawns a loader task and reports
//! the result to the owning barrier.
//!
//! Loading never fails from the barrier's point of view: a file or network error is logged
//! and the source resolves with empty content.

use crate::clients::ScriptLoaders;
use crate::model::{Document, NodeId};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Where a script's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOrigin {
    /// Body of the tag itself.
    Inline(String),
    /// File under the site root.
    LocalFile(PathBuf),
    /// Absolute `http://` or `https://` URL.
    Remote(String),
}

impl ScriptOrigin {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptOrigin::Inline(_) => "inline",
            ScriptOrigin::LocalFile(_) => "local",
            ScriptOrigin::Remote(_) => "remote",
        }
    }
}

/// Notification sent by a loader task when its script resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLoaded {
    pub index: usize,
    pub content: String,
}

/// A script tag's content and where it sits in the template.
#[derive(Debug, Clone)]
pub struct ScriptSource {
    index: usize,
    node: NodeId,
    origin: ScriptOrigin,
    server_only: bool,
    content: Option<String>,
}

impl ScriptSource {
    /// Describes the script element `node`, the `index`-th script of `document`.
    ///
    /// Local `src` values are resolved against `site_root`; a leading `/` is treated as the
    /// root itself.
    pub fn from_element(document: &Document, node: NodeId, index: usize, site_root: &Path) -> Self {
        let server_only = document
            .attribute(node, "runat")
            .is_some_and(|runat| runat.to_ascii_lowercase().contains("server"));

        let origin = match document.attribute(node, "src").filter(|src| !src.is_empty()) {
            None => ScriptOrigin::Inline(document.first_child_text(node).unwrap_or_default().to_string()),
            Some(src) if is_remote(src) => ScriptOrigin::Remote(src.to_string()),
            Some(src) => ScriptOrigin::LocalFile(site_root.join(src.trim_start_matches('/'))),
        };

        Self {
            index,
            node,
            origin,
            server_only,
            content: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The script's element in the template document.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn origin(&self) -> &ScriptOrigin {
        &self.origin
    }

    /// Marked `runat="server"`: executed per request, never sent to the client.
    pub fn is_server_only(&self) -> bool {
        self.server_only
    }

    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    /// Loaded content; empty until the source has resolved.
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Stores the loaded content. Returns `false`, leaving the source untouched, if it had
    /// already resolved.
    pub fn set_content(&mut self, content: String) -> bool {
        if self.content.is_some() {
            return false;
        }
        self.content = Some(content);
        true
    }

    /// Starts loading on its own task and reports to `notify` when done.
    ///
    /// Inline content is delivered after yielding to the scheduler, so every origin reaches
    /// the barrier the same way. Calling this twice for one source is not supported.
    pub fn resolve(&self, loaders: &ScriptLoaders, notify: mpsc::Sender<ScriptLoaded>) -> JoinHandle<()> {
        let index = self.index;
        let origin = self.origin.clone();
        let loaders = loaders.clone();

        tokio::spawn(async move {
            let content = load(&origin, &loaders).await;
            debug!(index, origin = origin.kind(), bytes = content.len(), "Script resolved");
            if notify.send(ScriptLoaded { index, content }).await.is_err() {
                debug!(index, "Barrier gone before script resolved");
            }
        })
    }
}

fn is_remote(src: &str) -> bool {
    let lowered = src.to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

async fn load(origin: &ScriptOrigin, loaders: &ScriptLoaders) -> String {
    match origin {
        ScriptOrigin::Inline(text) => {
            tokio::task::yield_now().await;
            text.clone()
        }
        ScriptOrigin::LocalFile(path) => loaders.reader.read(path).await.unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Local script failed to load");
            String::new()
        }),
        ScriptOrigin::Remote(url) => loaders.fetcher.fetch(url).await.unwrap_or_else(|e| {
            warn!(url = %url, error = %e, "Remote script failed to load");
            String::new()
        }),
    }
}
