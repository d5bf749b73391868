//! Conversion configuration and run-scoped context
//!
//! `ConvertConfig` is read from the `[convert]` table of an optional TOML file;
//! every field has a default so an empty file (or no file) is valid.
//!
//! ```toml
//! [convert]
//! output = "notes.enex"
//! drop_leading_heading = true
//! embed_images = true
//! strip_attributes = ["id", "class", "data", "data-cites"]
//! extensions = ["md", "markdown"]
//! ```

use chrono::{DateTime, Local, Utc};
use md2enex_content::{AttributePolicy, TransformOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

pub const APP_NAME: &str = "md2enex";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENEX_DOCTYPE: &str =
    r#"<!DOCTYPE en-export SYSTEM "http://xml.evernote.com/pub/evernote-export4.dtd">"#;

pub const DEFAULT_OUTPUT: &str = "export.enex";

/// Conversion settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Output file used when none is given on the command line
    pub output: PathBuf,

    /// Drop a leading `# Title` line from the note body
    pub drop_leading_heading: bool,

    /// Inline referenced images as base64 data URIs
    pub embed_images: bool,

    /// Attributes removed from every element of the note body
    pub strip_attributes: Vec<String>,

    /// File extensions treated as markdown notes (case-insensitive)
    pub extensions: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            drop_leading_heading: true,
            embed_images: true,
            strip_attributes: ["id", "class", "data", "data-cites"]
                .into_iter()
                .map(String::from)
                .collect(),
            extensions: vec!["md".to_string()],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    convert: ConvertConfig,
}

impl ConvertConfig {
    /// Parse the `[convert]` table of a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))?;
        file.convert.validate()?;
        Ok(file.convert)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(PipelineError::Config(
                "at least one markdown extension is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `path` has one of the configured markdown extensions
    pub fn is_markdown(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            drop_leading_heading: self.drop_leading_heading,
            embed_images: self.embed_images,
            attribute_policy: AttributePolicy::new(self.strip_attributes.iter().cloned()),
        }
    }
}

/// Values fixed once per run and shared by every note in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Run start, used as the export date
    pub started_at: DateTime<Utc>,
    /// Provenance tag attached to every note, `md2enex-import:<local time>`
    pub tag: String,
}

impl RunContext {
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    pub fn at(now: DateTime<Local>) -> Self {
        Self {
            started_at: now.with_timezone(&Utc),
            tag: format!("{}-import:{}", APP_NAME, now.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
