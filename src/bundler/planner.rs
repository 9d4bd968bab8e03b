//! Collapses adjacent client scripts into numbered bundles.

use crate::config::TemplateOptions;
use crate::framework::ScriptSource;
use crate::model::{Bundle, Document};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::debug;

static BUNDLE_REQUEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"script-(\d+)\.js$").expect("bundle pattern is valid"));

static INTER_TAG_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("whitespace pattern is valid"));

/// Path a bundle leader's `src` is rewritten to.
pub fn bundle_path(index: usize) -> String {
    format!("./script-{index}.js")
}

/// Bundle index named by a request path ending in `script-<index>.js`, if any.
pub fn bundle_index(path: &str) -> Option<usize> {
    BUNDLE_REQUEST
        .captures(path)
        .and_then(|caps| caps.get(1))
        .and_then(|index| index.as_str().parse().ok())
}

/// Removes whitespace-only runs between a `>` and the next `<`, and around the markup.
///
/// Leading and trailing whitespace goes too: the HTML parser would otherwise move it into
/// `<body>`, next to the last tag.
pub fn compact_whitespace(markup: &str) -> Cow<'_, str> {
    INTER_TAG_WHITESPACE.replace_all(markup.trim(), "><")
}

/// Ordered, immutable bundle list of a prepared template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleTable {
    bundles: Vec<Bundle>,
}

impl BundleTable {
    pub fn get(&self, index: usize) -> Option<&Bundle> {
        self.bundles.get(index)
    }

    /// The bundle at `index` if it has content worth serving.
    pub fn servable(&self, index: usize) -> Option<&Bundle> {
        self.get(index).filter(|bundle| bundle.is_servable())
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.iter()
    }
}

/// Rewrites a loaded template's script tags into bundles.
#[derive(Debug, Clone, Copy)]
pub struct BundlePlanner {
    merge: bool,
}

impl BundlePlanner {
    pub fn new(options: TemplateOptions) -> Self {
        Self {
            merge: options.merges_scripts(),
        }
    }

    /// Mutates `document` and returns its bundle table.
    ///
    /// Server-only scripts are always detached. With merging enabled, each client script
    /// either joins the current bundle (when its previous element sibling is a script, so
    /// its node is removed) or opens a new bundle (its node's `src` now points at the
    /// bundle and its inline body is dropped). `scripts` must be in document order.
    pub fn plan(&self, document: &mut Document, scripts: &[ScriptSource]) -> BundleTable {
        for script in scripts.iter().filter(|s| s.is_server_only()) {
            document.detach(script.node());
        }
        if !self.merge {
            return BundleTable::default();
        }

        let mut bundles: Vec<Bundle> = Vec::new();
        for script in scripts.iter().filter(|s| !s.is_server_only()) {
            let node = script.node();
            let follows_script = document
                .previous_element_sibling(node)
                .is_some_and(|prev| document.tag_name(prev) == Some("script"));

            match bundles.last_mut() {
                Some(current) if follows_script => {
                    current.append(script.content());
                    document.detach(node);
                    debug!(index = script.index(), bundle = current.index(), "Script merged");
                }
                _ => {
                    let index = bundles.len();
                    bundles.push(Bundle::open(index, script.content()));
                    document.clear_children(node);
                    document.set_attribute(node, "src", &bundle_path(index));
                    debug!(index = script.index(), bundle = index, "Bundle opened");
                }
            }
        }

        for bundle in &mut bundles {
            bundle.finalize();
        }
        BundleTable { bundles }
    }
}
