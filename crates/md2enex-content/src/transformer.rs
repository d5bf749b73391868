//! Markdown body -> ENML content
//!
//! ## Steps
//!
//! 1. **Render**: markdown to markup through the configured `MarkupConverter`
//! 2. **Heading drop**: a leading `<h1>` line is removed, the note title is
//!    carried separately by the export record
//! 3. **Embed**: resolvable `<img src>` references become data URIs
//! 4. **Sanitize**: wrap in `<en-note>`, check well-formedness, strip attributes
//! 5. **Wrap**: prepend the XML declaration and ENML doctype

use std::path::Path;
use tracing::debug;

use crate::enml::wrap_enml;
use crate::error::Result;
use crate::images::{embed_images, EmbeddedImages, FsImageResolver, ImageResolver};
use crate::markdown_it::{MarkdownItConverter, MarkupConverter};
use crate::sanitize::{sanitize_fragment, AttributePolicy};

/// Knobs for a single transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Drop the first rendered line when it is a top-level heading
    pub drop_leading_heading: bool,
    /// Inline resolvable images as base64 data URIs
    pub embed_images: bool,
    /// Attributes removed from every element
    pub attribute_policy: AttributePolicy,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            drop_leading_heading: true,
            embed_images: true,
            attribute_policy: AttributePolicy::default(),
        }
    }
}

/// Output of a successful transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedContent {
    /// Full ENML document (declaration, doctype, `<en-note>`)
    pub enml: String,
    /// Image references that were embedded inline
    pub embedded_images: EmbeddedImages,
}

pub struct ContentTransformer {
    converter: Box<dyn MarkupConverter>,
    resolver: Box<dyn ImageResolver>,
    options: TransformOptions,
}

impl ContentTransformer {
    /// Transformer using markdown-it and filesystem image resolution
    pub fn new(options: TransformOptions) -> Self {
        Self {
            converter: Box::new(MarkdownItConverter::new()),
            resolver: Box::new(FsImageResolver),
            options,
        }
    }

    pub fn with_converter(mut self, converter: impl MarkupConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn with_resolver(mut self, resolver: impl ImageResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Transform one note body. `note_dir` is the directory holding the note,
    /// image references are resolved against it.
    ///
    /// Fails with `ContentError::Markup` when the rendered markup is not
    /// well-formed; unresolved images never fail.
    pub fn transform(&self, markdown: &str, note_dir: &Path) -> Result<TransformedContent> {
        let rendered = self.converter.convert(markdown);

        let body = if self.options.drop_leading_heading {
            drop_leading_heading(&rendered)
        } else {
            rendered.as_str()
        };

        let (body, embedded_images) = if self.options.embed_images {
            embed_images(body, note_dir, self.resolver.as_ref())
        } else {
            (body.to_string(), Vec::new())
        };

        let note = sanitize_fragment(body.trim(), &self.options.attribute_policy)?;
        if note.media_elements > 0 {
            debug!(
                "Note content keeps {} image/figure element(s), {} embedded",
                note.media_elements,
                embedded_images.len()
            );
        }

        Ok(TransformedContent {
            enml: wrap_enml(&note.markup),
            embedded_images,
        })
    }
}

impl Default for ContentTransformer {
    fn default() -> Self {
        Self::new(TransformOptions::default())
    }
}

/// Remove the first line if it is an `<h1>` heading.
fn drop_leading_heading(rendered: &str) -> &str {
    let (first, rest) = rendered.split_once('\n').unwrap_or((rendered, ""));
    if first.trim_start().starts_with("<h1") {
        rest
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentError;

    /// Returns canned markup regardless of input
    struct Canned(&'static str);

    impl MarkupConverter for Canned {
        fn convert(&self, _markdown: &str) -> String {
            self.0.to_string()
        }
    }

    struct AlwaysFound;

    impl ImageResolver for AlwaysFound {
        fn resolve(&self, _note_dir: &Path, _reference: &str) -> Option<Vec<u8>> {
            Some(vec![0x89, 0x50, 0x4e, 0x47])
        }
    }

    fn body_of(content: &TransformedContent) -> &str {
        content.enml.lines().nth(2).unwrap()
    }

    #[test]
    fn test_drops_leading_heading() {
        let transformer = ContentTransformer::default()
            .with_converter(Canned("<h1>Alpha</h1>\n<p>Body</p>\n"));

        let out = transformer.transform("ignored", Path::new(".")).unwrap();

        assert_eq!(body_of(&out), "<en-note><p>Body</p></en-note>");
    }

    #[test]
    fn test_keeps_heading_when_disabled() {
        let options = TransformOptions {
            drop_leading_heading: false,
            ..TransformOptions::default()
        };
        let transformer =
            ContentTransformer::new(options).with_converter(Canned("<h1>Alpha</h1>\n<p>Body</p>\n"));

        let out = transformer.transform("ignored", Path::new(".")).unwrap();

        assert!(body_of(&out).starts_with("<en-note><h1>Alpha</h1>"));
    }

    #[test]
    fn test_later_headings_are_kept() {
        let transformer = ContentTransformer::default()
            .with_converter(Canned("<p>Intro</p>\n<h1>Second</h1>\n"));

        let out = transformer.transform("ignored", Path::new(".")).unwrap();

        assert!(body_of(&out).contains("<h1>Second</h1>"));
        assert!(body_of(&out).contains("<p>Intro</p>"));
    }

    #[test]
    fn test_images_in_dropped_heading_are_not_embedded() {
        let transformer = ContentTransformer::default()
            .with_converter(Canned("<h1><img src=\"logo.png\" alt=\"\" /></h1>\n<p>x</p>\n"))
            .with_resolver(AlwaysFound);

        let out = transformer.transform("ignored", Path::new(".")).unwrap();

        assert!(out.embedded_images.is_empty());
    }

    #[test]
    fn test_embeds_and_sanitizes() {
        let transformer = ContentTransformer::default()
            .with_converter(Canned(
                "<p class=\"lead\"><img src=\"pic.png\" alt=\"pic\" /></p>\n",
            ))
            .with_resolver(AlwaysFound);

        let out = transformer.transform("ignored", Path::new(".")).unwrap();

        assert_eq!(out.embedded_images, vec!["pic.png".to_string()]);
        assert!(body_of(&out).contains("data:image/png;base64,iVBORw=="));
        assert!(!body_of(&out).contains("class="));
    }

    #[test]
    fn test_embedding_disabled() {
        let options = TransformOptions {
            embed_images: false,
            ..TransformOptions::default()
        };
        let transformer = ContentTransformer::new(options)
            .with_converter(Canned("<p><img src=\"pic.png\" alt=\"pic\" /></p>\n"))
            .with_resolver(AlwaysFound);

        let out = transformer.transform("ignored", Path::new(".")).unwrap();

        assert!(out.embedded_images.is_empty());
        assert!(body_of(&out).contains("src=\"pic.png\""));
    }

    #[test]
    fn test_malformed_markup_is_an_error() {
        let transformer =
            ContentTransformer::default().with_converter(Canned("<p><b>x</p></b>\n"));

        let err = transformer.transform("ignored", Path::new(".")).unwrap_err();

        assert!(matches!(err, ContentError::Markup { .. }));
    }

    #[test]
    fn test_markdown_it_end_to_end() {
        let transformer = ContentTransformer::default();

        let out = transformer
            .transform("# Alpha\n\nline one\nline two\n", Path::new("."))
            .unwrap();

        assert!(out.enml.starts_with("<?xml"));
        assert!(!out.enml.contains("<h1>"));
        assert!(out.enml.contains("line one<br/>"));
    }
}
