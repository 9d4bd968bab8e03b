//! A numbered, independently servable run of client scripts.

/// One entry of a template's bundle table.
///
/// A bundle is opened by the first script of a run of adjacent script tags and grows as the
/// following scripts are appended to it. Once the planner finalizes the table, a bundle is
/// servable if it has any content to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    index: usize,
    content: String,
    servable: bool,
}

impl Bundle {
    pub(crate) fn open(index: usize, content: &str) -> Self {
        Self {
            index,
            content: content.to_string(),
            servable: false,
        }
    }

    pub(crate) fn append(&mut self, content: &str) {
        self.content.push_str(content);
    }

    pub(crate) fn finalize(&mut self) {
        self.servable = !self.content.is_empty();
    }

    /// Zero-based position in the bundle table, stable once the template is ready.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_servable(&self) -> bool {
        self.servable
    }
}
