//! Inline image embedding
//!
//! Rewrites `<img src="...">` references in rendered markup into base64
//! `data:` URIs. References are percent-decoded and resolved against the
//! directory holding the note. A reference that cannot be resolved is left
//! exactly as written and only produces a warning.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

static IMG_SRC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img src="([^"]+)""#).expect("img src regex"));

/// Resolves an image reference found in a note to its bytes.
///
/// `None` means "not found"; implementations have no other side effects.
pub trait ImageResolver {
    fn resolve(&self, note_dir: &Path, reference: &str) -> Option<Vec<u8>>;
}

/// Resolves references relative to the note directory on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageResolver;

impl FsImageResolver {
    fn resolve_path(note_dir: &Path, reference: &str) -> PathBuf {
        note_dir.join(reference)
    }
}

impl ImageResolver for FsImageResolver {
    fn resolve(&self, note_dir: &Path, reference: &str) -> Option<Vec<u8>> {
        let path = Self::resolve_path(note_dir, reference);
        if !path.is_file() {
            return None;
        }

        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Image {} exists but could not be read: {}", path.display(), e);
                None
            }
        }
    }
}

/// References that were replaced by inline data, in document order.
pub type EmbeddedImages = Vec<String>;

/// Replace every resolvable image reference in `html` with an inline data URI.
///
/// Only the `src` value is rewritten; the remaining attributes of the tag are
/// kept. Returns the rewritten markup and the references that were embedded
/// (as written in the markup, one entry per replaced tag).
pub fn embed_images(
    html: &str,
    note_dir: &Path,
    resolver: &dyn ImageResolver,
) -> (String, EmbeddedImages) {
    let mut embedded = Vec::new();

    let rewritten = IMG_SRC_REGEX.replace_all(html, |caps: &Captures<'_>| {
        let src = &caps[1];
        if src.starts_with("data:") {
            return caps[0].to_string();
        }

        let reference = decode_reference(src);
        match resolver.resolve(note_dir, &reference) {
            Some(bytes) => {
                debug!("Embedding image {} ({} bytes)", reference, bytes.len());
                embedded.push(src.to_string());
                format!(
                    r#"<img src="data:{};base64,{}""#,
                    mime_type_for(&reference),
                    STANDARD.encode(&bytes)
                )
            }
            None => {
                warn!("Image {} not found, skipping embedding.", src);
                caps[0].to_string()
            }
        }
    });

    (rewritten.into_owned(), embedded)
}

/// Undo attribute escaping, then percent-decoding.
fn decode_reference(src: &str) -> String {
    let unescaped = quick_xml::escape::unescape(src)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| src.to_string());

    match urlencoding::decode(&unescaped) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => unescaped,
    }
}

fn mime_type_for(reference: &str) -> &'static str {
    let extension = Path::new(reference)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    /// In-memory resolver keyed by decoded reference
    struct MapResolver(HashMap<String, Vec<u8>>);

    impl MapResolver {
        fn with(entries: &[(&str, &[u8])]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_vec()))
                    .collect(),
            )
        }
    }

    impl ImageResolver for MapResolver {
        fn resolve(&self, _note_dir: &Path, reference: &str) -> Option<Vec<u8>> {
            self.0.get(reference).cloned()
        }
    }

    #[test]
    fn test_embeds_resolved_image() {
        let resolver = MapResolver::with(&[("pic.png", b"PNGDATA")]);
        let html = r#"<p><img src="pic.png" alt="pic" /></p>"#;

        let (out, embedded) = embed_images(html, Path::new("."), &resolver);

        assert_eq!(embedded, vec!["pic.png".to_string()]);
        assert!(out.contains(&format!(
            r#"<img src="data:image/png;base64,{}" alt="pic" />"#,
            STANDARD.encode(b"PNGDATA")
        )));
    }

    #[test]
    fn test_unresolved_image_left_untouched() {
        let resolver = MapResolver::with(&[]);
        let html = r#"<p><img src="missing.png" alt="gone" /></p>"#;

        let (out, embedded) = embed_images(html, Path::new("."), &resolver);

        assert!(embedded.is_empty());
        assert_eq!(out, html);
    }

    #[test]
    fn test_percent_encoded_reference_is_decoded() {
        let resolver = MapResolver::with(&[("my pic.png", b"x")]);
        let html = r#"<img src="my%20pic.png" alt="" />"#;

        let (out, embedded) = embed_images(html, Path::new("."), &resolver);

        assert_eq!(embedded.len(), 1);
        assert!(out.starts_with(r#"<img src="data:image/png;base64,"#));
    }

    #[test]
    fn test_each_reference_counts_once() {
        let resolver = MapResolver::with(&[("a.png", b"a"), ("b.gif", b"b")]);
        let html = r#"<img src="a.png" alt="" /><img src="b.gif" alt="" /><img src="c.png" alt="" />"#;

        let (out, embedded) = embed_images(html, Path::new("."), &resolver);

        assert_eq!(embedded, vec!["a.png".to_string(), "b.gif".to_string()]);
        assert!(out.contains("data:image/gif;base64,"));
        assert!(out.contains(r#"<img src="c.png""#));
    }

    #[test]
    fn test_existing_data_uri_is_not_reembedded() {
        let resolver = MapResolver::with(&[]);
        let html = r#"<img src="data:image/png;base64,AAAA" alt="" />"#;

        let (out, embedded) = embed_images(html, Path::new("."), &resolver);

        assert!(embedded.is_empty());
        assert_eq!(out, html);
    }

    #[test_case("photo.JPG", "image/jpeg")]
    #[test_case("photo.jpeg", "image/jpeg")]
    #[test_case("anim.gif", "image/gif")]
    #[test_case("icon.svg", "image/svg+xml")]
    #[test_case("shot.webp", "image/webp")]
    #[test_case("noext", "image/png")]
    fn test_mime_type_for(reference: &str, expected: &str) {
        assert_eq!(mime_type_for(reference), expected);
    }

    #[test]
    fn test_fs_resolver_reads_relative_to_note_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/one.png"), b"bytes").unwrap();

        let resolver = FsImageResolver;

        assert_eq!(
            resolver.resolve(dir.path(), "assets/one.png"),
            Some(b"bytes".to_vec())
        );
        assert_eq!(resolver.resolve(dir.path(), "assets/two.png"), None);
        assert_eq!(resolver.resolve(dir.path(), "assets"), None);
    }
}
