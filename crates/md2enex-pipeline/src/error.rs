//! Error types for md2enex-pipeline

use md2enex_content::ContentError;
use std::path::PathBuf;
use thiserror::Error;

/// Run-aborting failures
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No markdown files found in {}", dir.display())]
    NoMarkdownFiles { dir: PathBuf },

    #[error("Failed to serialize export document: {0}")]
    Serialize(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single note could not be assembled. Never aborts the run.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Failed to read note: {0}")]
    Read(#[from] std::io::Error),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Note {field} contains character U+{code:04X}, which is not allowed in XML")]
    InvalidCharacter { field: &'static str, code: u32 },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
