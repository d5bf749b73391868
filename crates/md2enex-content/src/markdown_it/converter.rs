//! Render markdown to XHTML-style markup with markdown-it

use markdown_it::plugins::cmark::inline::newline::{Hardbreak, Softbreak};
use markdown_it::MarkdownIt;

/// Converts a markdown body into a structural markup fragment.
///
/// The rest of the transformation (image embedding, sanitizing, heading
/// removal) only depends on this seam, so it can be driven by a canned
/// converter in tests.
pub trait MarkupConverter {
    fn convert(&self, markdown: &str) -> String;
}

/// Converter using markdown-it-rust
///
/// CommonMark plus raw HTML passthrough. Every soft line break is rendered as
/// a hard break so the note keeps the line structure of its source. No
/// typographer and no heading anchors are installed, so quotes, dashes and
/// headings come through unchanged.
pub struct MarkdownItConverter {
    md: MarkdownIt,
}

impl MarkdownItConverter {
    pub fn new() -> Self {
        let mut md = MarkdownIt::new();

        markdown_it::plugins::cmark::add(&mut md);
        markdown_it::plugins::html::add(&mut md);

        Self { md }
    }
}

impl Default for MarkdownItConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupConverter for MarkdownItConverter {
    fn convert(&self, markdown: &str) -> String {
        let mut ast = self.md.parse(markdown);

        ast.walk_mut(|node, _depth| {
            if node.is::<Softbreak>() {
                node.replace(Hardbreak);
            }
        });

        // xhtml output: void elements are self-closed, which the XML checks rely on
        ast.xrender()
    }
}
