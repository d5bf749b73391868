//! Error types for md2enex-content

use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    /// The rendered markup is not a well-formed XML fragment.
    #[error("Markup is not well-formed: {message}")]
    Markup { message: String },
}

impl ContentError {
    pub fn markup(message: impl Display) -> Self {
        Self::Markup {
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
