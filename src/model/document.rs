//! # Document Tree
//!
//! An explicit, owned node tree for template markup.
//!
//! Markup is parsed by html5ever (through `scraper`), so the tree is the one a browser would
//! build: character references are decoded, raw-text elements end only at their real end
//! tag, and missing `<html>`/`<head>`/`<body>` elements are implied. The parsed tree is then
//! copied into an arena (`Vec<Node>`) addressed by [`NodeId`].
//!
//! Detaching a node only unlinks it from its parent; the id stays valid, so
//! [`ScriptSource`](crate::framework::ScriptSource) can hold on to its position in the
//! document for the whole template lifetime.

use scraper::Html;
use tracing::debug;

/// Opaque handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A single `name="value"` pair on an element. The value is stored decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    /// Doctype name, `html` for `<!DOCTYPE html>`.
    Doctype(String),
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

// Children of these are serialized without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Markup owned as a tree of nodes, plus the navigation context scripts run under.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    location: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
            location: None,
        }
    }
}

impl Document {
    /// Parses a full HTML document. Never fails: html5ever recovers from any markup.
    pub fn parse(markup: &str) -> Self {
        let html = Html::parse_document(markup);
        if !html.errors.is_empty() {
            debug!(errors = html.errors.len(), "Template markup has parse errors");
        }

        let mut doc = Self::default();
        let root = doc.root();
        let mut pending: Vec<_> = html.tree.root().children().map(|node| (root, node)).collect();
        pending.reverse();

        while let Some((parent, node)) = pending.pop() {
            let kind = match node.value() {
                scraper::Node::Doctype(doctype) => NodeKind::Doctype(doctype.name().to_string()),
                scraper::Node::Comment(comment) => NodeKind::Comment(String::from(&**comment)),
                scraper::Node::Text(text) => {
                    doc.append_text(parent, text);
                    continue;
                }
                scraper::Node::Element(element) => NodeKind::Element {
                    name: element.name().to_string(),
                    attributes: element
                        .attrs()
                        .map(|(name, value)| Attribute {
                            name: name.to_string(),
                            value: value.to_string(),
                        })
                        .collect(),
                },
                _ => continue,
            };

            let id = doc.append(parent, kind);
            let first = pending.len();
            pending.extend(node.children().map(|child| (id, child)));
            pending[first..].reverse();
        }

        doc
    }

    /// The document's root node. It has no markup of its own.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Lowercased tag name, or `None` for non-element nodes.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(name))
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    /// Sets an attribute on an element, replacing any existing value. No-op on other nodes.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            match attributes.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
                Some(attr) => attr.value = value.to_string(),
                None => attributes.push(Attribute {
                    name: name.to_ascii_lowercase(),
                    value: value.to_string(),
                }),
            }
        }
    }

    /// Creates a detached element. Attach it with [`Document::append_child`].
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    /// Moves `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Appends text to `parent`, merging with a trailing text child.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(text);
                return;
            }
        }
        self.append(parent, NodeKind::Text(text.to_string()));
    }

    /// Unlinks a node from its parent. The node and its subtree stay addressable.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Whether the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
        }
        current == self.root()
    }

    pub fn clear_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    /// Closest preceding sibling that is an element. Text and comments are skipped.
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let position = siblings.iter().position(|&c| c == id)?;
        siblings[..position]
            .iter()
            .rev()
            .copied()
            .find(|&s| matches!(self.nodes[s.0].kind, NodeKind::Element { .. }))
    }

    /// Text of the first child if that child is a text node.
    pub fn first_child_text(&self, id: NodeId) -> Option<&str> {
        let first = *self.nodes[id.0].children.first()?;
        match &self.nodes[first.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    /// Attached elements with the given tag name, in document order.
    pub fn elements_by_tag_name(&self, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut pending = vec![self.root()];
        while let Some(id) = pending.pop() {
            if self
                .tag_name(id)
                .is_some_and(|tag| tag.eq_ignore_ascii_case(name))
            {
                found.push(id);
            }
            pending.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        found
    }

    /// The URL scripts see as the current navigation context.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = Some(location.into());
    }

    /// Doctype followed by the markup of every attached node.
    pub fn serialize(&self) -> String {
        self.outer_html(self.root())
    }

    /// Markup of `id` and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.push(kind);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let NodeKind::Text(text) = &self.nodes[id.0].kind {
            out.push_str(text);
        }
        for &child in &self.nodes[id.0].children {
            self.collect_text(child, out);
        }
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Root => {}
            NodeKind::Doctype(name) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
                return;
            }
            NodeKind::Text(text) => {
                let raw = node
                    .parent
                    .and_then(|parent| self.tag_name(parent))
                    .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
                if raw {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
                return;
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
                return;
            }
            NodeKind::Element { name, attributes } => {
                out.push('<');
                out.push_str(name);
                for attr in attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    escape_into(&attr.value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }
            }
        }

        for &child in &node.children {
            self.write_node(child, out);
        }

        if let NodeKind::Element { name, .. } = &node.kind {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

/// HTML serialization escaping for text (`attribute == false`) or attribute values.
fn escape_into(value: &str, attribute: bool, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<!DOCTYPE html><html><head><title>Hi</title></head>\n<body class=\"main\"><p>one<br>two</p><!-- note --></body></html>";

    fn only(doc: &Document, tag: &str) -> NodeId {
        let found = doc.elements_by_tag_name(tag);
        assert_eq!(found.len(), 1, "expected one <{tag}>");
        found[0]
    }

    #[test]
    fn test_complete_document_serializes_to_its_source() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.serialize(), PAGE);
    }

    #[test]
    fn test_missing_structure_is_implied() {
        let doc = Document::parse("<p>hi</p>");
        assert_eq!(doc.serialize(), "<html><head></head><body><p>hi</p></body></html>");
    }

    #[test]
    fn test_script_body_is_raw_text() {
        let doc = Document::parse("<script>if (a < b && c > d) { x = '</p>'; }</script><p>after</p>");
        let script = only(&doc, "script");
        assert_eq!(
            doc.first_child_text(script),
            Some("if (a < b && c > d) { x = '</p>'; }")
        );
        assert_eq!(doc.elements_by_tag_name("p").len(), 1);
        assert!(doc
            .serialize()
            .contains("<script>if (a < b && c > d) { x = '</p>'; }</script>"));
    }

    #[test]
    fn test_script_ends_only_at_its_own_end_tag() {
        let doc = Document::parse("<body><script>var s = \"</scripts>\"; go();</script><script>b</script></body>");
        let scripts = doc.elements_by_tag_name("script");
        assert_eq!(scripts.len(), 2);
        assert_eq!(doc.first_child_text(scripts[0]), Some("var s = \"</scripts>\"; go();"));
        let body = only(&doc, "body");
        assert_eq!(
            doc.outer_html(body),
            "<body><script>var s = \"</scripts>\"; go();</script><script>b</script></body>"
        );
    }

    #[test]
    fn test_character_references_are_decoded_and_escaped_again() {
        let doc = Document::parse("<body><a href=\"/q?x=1&amp;y=&quot;2&quot;\">fish &amp; chips &lt;3</a></body>");
        let a = only(&doc, "a");
        assert_eq!(doc.attribute(a, "href"), Some("/q?x=1&y=\"2\""));
        assert_eq!(doc.text_content(a), "fish & chips <3");
        assert_eq!(
            doc.outer_html(a),
            "<a href=\"/q?x=1&amp;y=&quot;2&quot;\">fish &amp; chips &lt;3</a>"
        );
    }

    #[test]
    fn test_attributes_are_case_insensitive_and_keep_values() {
        let doc = Document::parse("<SCRIPT RunAt='Server' src=lib.js async></SCRIPT>");
        let script = only(&doc, "script");
        assert_eq!(doc.tag_name(script), Some("script"));
        assert_eq!(doc.attribute(script, "runat"), Some("Server"));
        assert_eq!(doc.attribute(script, "SRC"), Some("lib.js"));
        assert_eq!(doc.attribute(script, "async"), Some(""));
    }

    #[test]
    fn test_previous_element_sibling_skips_text_and_comments() {
        let doc = Document::parse("<div><script>a</script>\n  <!-- c -->\n<script>b</script><p></p><script>c</script></div>");
        let scripts = doc.elements_by_tag_name("script");
        assert_eq!(doc.previous_element_sibling(scripts[0]), None);
        assert_eq!(doc.previous_element_sibling(scripts[1]), Some(scripts[0]));
        let p = doc.previous_element_sibling(scripts[2]).unwrap();
        assert_eq!(doc.tag_name(p), Some("p"));
    }

    #[test]
    fn test_detach_removes_node_from_output_but_keeps_id() {
        let mut doc = Document::parse("<body><script>a</script><script>b</script></body>");
        let scripts = doc.elements_by_tag_name("script");
        doc.detach(scripts[0]);
        assert!(!doc.is_attached(scripts[0]));
        assert_eq!(doc.first_child_text(scripts[0]), Some("a"));
        assert_eq!(doc.outer_html(only(&doc, "body")), "<body><script>b</script></body>");
        assert_eq!(doc.elements_by_tag_name("script"), vec![scripts[1]]);
    }

    #[test]
    fn test_set_attribute_and_clear_children() {
        let mut doc = Document::parse("<script>inline()</script>");
        let script = only(&doc, "script");
        doc.clear_children(script);
        doc.set_attribute(script, "src", "./script-0.js");
        assert_eq!(doc.outer_html(script), "<script src=\"./script-0.js\"></script>");
    }

    #[test]
    fn test_stray_end_tags_are_ignored() {
        let doc = Document::parse("<div>a</span>b</div>");
        assert_eq!(doc.outer_html(only(&doc, "div")), "<div>ab</div>");
    }

    #[test]
    fn test_appended_elements_serialize() {
        let mut doc = Document::parse("<body></body>");
        let body = only(&doc, "body");
        let p = doc.create_element("P");
        doc.append_text(p, "hello");
        doc.append_child(body, p);
        assert_eq!(doc.outer_html(body), "<body><p>hello</p></body>");
        assert_eq!(doc.text_content(body), "hello");
    }
}
