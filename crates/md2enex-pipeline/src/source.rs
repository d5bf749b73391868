//! Source notes on disk

use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ConvertConfig;
use crate::error::{PipelineError, Result};

/// A markdown file read once for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNote {
    pub path: PathBuf,
    /// File stem, whitespace-trimmed
    pub title: String,
    pub body: String,
    /// Birth time where the platform records it, otherwise modification time
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl SourceNote {
    pub fn load(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified()?;
        let created = metadata.created().unwrap_or(modified);

        let body = fs::read_to_string(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            title: title_from_path(path),
            body,
            created: DateTime::<Utc>::from(created),
            modified: DateTime::<Utc>::from(modified),
        })
    }

    /// Directory image references are resolved against
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .unwrap_or_default()
}

/// Markdown files directly inside `dir`, sorted by lowercased file name.
///
/// Subdirectories are not descended into.
pub fn list_markdown_files(dir: &Path, config: &ConvertConfig) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && config.is_markdown(&path) {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|p| sort_key(p));
    Ok(files)
}

fn sort_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
