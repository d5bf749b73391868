//! markdown-it backed markup conversion

pub mod converter;

pub use converter::{MarkdownItConverter, MarkupConverter};
