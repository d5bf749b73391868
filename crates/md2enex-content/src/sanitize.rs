//! Attribute sanitizing and well-formedness checking
//!
//! The rendered fragment is wrapped in an `<en-note>` root and re-emitted
//! event by event with quick-xml. Anything an XML parser would reject
//! (mismatched or unclosed tags, unknown entities, broken attributes) turns
//! into `ContentError::Markup`; elements lose the attributes the ENML format
//! does not accept.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::str;

use crate::enml::EN_NOTE_ROOT;
use crate::error::{ContentError, Result};

/// Attributes removed from every element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePolicy {
    disallowed: Vec<String>,
}

impl AttributePolicy {
    pub fn new<I, S>(disallowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            disallowed: disallowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_disallowed(&self, name: &str) -> bool {
        self.disallowed.iter().any(|d| d == name)
    }
}

impl Default for AttributePolicy {
    fn default() -> Self {
        Self::new(["id", "class", "data", "data-cites"])
    }
}

/// A checked `<en-note>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedNote {
    /// Serialized `<en-note>...</en-note>` element
    pub markup: String,
    /// Number of `img` and `figure` elements left in the note
    pub media_elements: usize,
}

/// Wrap `fragment` in an `<en-note>` root, verify it is well-formed and strip
/// disallowed attributes from every element.
pub fn sanitize_fragment(fragment: &str, policy: &AttributePolicy) -> Result<SanitizedNote> {
    let wrapped = format!("<{root}>{fragment}</{root}>", root = EN_NOTE_ROOT);

    let mut reader = Reader::from_str(&wrapped);
    let mut writer = Writer::new(Vec::with_capacity(wrapped.len()));

    let mut depth = 0usize;
    let mut root_closed = false;
    let mut media_elements = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            ContentError::markup(format!("{} at byte {}", e, reader.buffer_position()))
        })?;

        if root_closed && !matches!(event, Event::Eof) {
            return Err(ContentError::markup(
                "content found after the en-note element was closed",
            ));
        }

        let out = match event {
            Event::Start(start) => {
                depth += 1;
                if is_media(&start) {
                    media_elements += 1;
                }
                Event::Start(strip_attributes(&start, policy)?)
            }
            Event::Empty(start) => {
                if is_media(&start) {
                    media_elements += 1;
                }
                Event::Empty(strip_attributes(&start, policy)?)
            }
            Event::End(end) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ContentError::markup("unexpected closing tag"))?;
                if depth == 0 {
                    root_closed = true;
                }
                Event::End(end)
            }
            Event::Text(text) => {
                // Rejects entities XML does not define, e.g. &nbsp;
                text.unescape().map_err(ContentError::markup)?;
                Event::Text(text)
            }
            Event::Decl(_) | Event::DocType(_) => {
                return Err(ContentError::markup(
                    "declarations are not allowed inside note content",
                ));
            }
            Event::Eof => break,
            other => other,
        };

        writer.write_event(out).map_err(ContentError::markup)?;
    }

    if depth != 0 || !root_closed {
        return Err(ContentError::markup(format!(
            "{} element(s) left unclosed",
            depth.max(1)
        )));
    }

    let markup = String::from_utf8(writer.into_inner()).map_err(ContentError::markup)?;

    Ok(SanitizedNote {
        markup,
        media_elements,
    })
}

fn is_media(start: &BytesStart<'_>) -> bool {
    matches!(start.name().as_ref(), b"img" | b"figure")
}

fn strip_attributes(start: &BytesStart<'_>, policy: &AttributePolicy) -> Result<BytesStart<'static>> {
    let name = str::from_utf8(start.name().as_ref())
        .map_err(ContentError::markup)?
        .to_string();
    let mut clean = BytesStart::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(ContentError::markup)?;
        let key = str::from_utf8(attr.key.as_ref()).map_err(ContentError::markup)?;
        if policy.is_disallowed(key) {
            continue;
        }
        // Re-escaped on push, so single-quoted values stay valid in double quotes
        let value = attr.unescape_value().map_err(ContentError::markup)?;
        clean.push_attribute((key, value.as_ref()));
    }

    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(fragment: &str) -> Result<SanitizedNote> {
        sanitize_fragment(fragment, &AttributePolicy::default())
    }

    #[test]
    fn test_wraps_in_en_note() {
        let note = sanitize("<p>Hello</p>").unwrap();

        assert_eq!(note.markup, "<en-note><p>Hello</p></en-note>");
        assert_eq!(note.media_elements, 0);
    }

    #[test]
    fn test_strips_disallowed_attributes() {
        let note = sanitize(
            r#"<div id="top" class="wide" data="x" data-cites="y" title="keep"><span class="c">t</span></div>"#,
        )
        .unwrap();

        assert_eq!(
            note.markup,
            r#"<en-note><div title="keep"><span>t</span></div></en-note>"#
        );
    }

    #[test]
    fn test_strips_attributes_on_empty_elements() {
        let note = sanitize(r#"<img src="a.png" alt="a" class="pic" />"#).unwrap();

        assert!(note.markup.contains(r#"<img src="a.png" alt="a"/>"#));
        assert_eq!(note.media_elements, 1);
    }

    #[test]
    fn test_escaped_attribute_values_survive() {
        let note = sanitize(r#"<a href="?a=1&amp;b=2">q</a>"#).unwrap();

        assert!(note.markup.contains(r#"href="?a=1&amp;b=2""#));
    }

    #[test]
    fn test_custom_policy() {
        let policy = AttributePolicy::new(["title"]);
        let note = sanitize_fragment(r#"<p title="t" class="c">x</p>"#, &policy).unwrap();

        assert_eq!(note.markup, r#"<en-note><p class="c">x</p></en-note>"#);
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let err = sanitize("<p><b>bold</p></b>").unwrap_err();
        assert!(matches!(err, ContentError::Markup { .. }));
    }

    #[test]
    fn test_unclosed_void_element_fails() {
        assert!(sanitize("<p>line<br>next</p>").is_err());
    }

    #[test]
    fn test_unknown_entity_fails() {
        assert!(sanitize("<p>a&nbsp;b</p>").is_err());
    }

    #[test]
    fn test_stray_root_close_fails() {
        assert!(sanitize("<p>x</p></en-note><p>y</p>").is_err());
    }

    #[test]
    fn test_counts_figures_and_images() {
        let note = sanitize(r#"<figure><img src="x.png" /></figure>"#).unwrap();
        assert_eq!(note.media_elements, 2);
    }
}
