//! md2enex content transformation
//!
//! Turns the markdown body of a single note into an ENML document that can be
//! placed inside an `.enex` export. This crate provides:
//! - A pluggable markdown renderer (`MarkupConverter`), backed by markdown-it
//! - Inline embedding of referenced images as base64 data URIs
//! - Attribute sanitizing and well-formedness checking of the produced markup
//! - ENML wrapping (XML declaration + en-note doctype)

pub mod enml;
pub mod error;
pub mod images;
pub mod markdown_it;
pub mod sanitize;
pub mod transformer;

pub use enml::{wrap_enml, ENML_DOCTYPE, EN_NOTE_ROOT};
pub use error::{ContentError, Result};
pub use images::{embed_images, EmbeddedImages, FsImageResolver, ImageResolver};
pub use crate::markdown_it::{MarkdownItConverter, MarkupConverter};
pub use sanitize::{sanitize_fragment, AttributePolicy, SanitizedNote};
pub use transformer::{ContentTransformer, TransformOptions, TransformedContent};
