//! Pre-scan and post-conversion counts
//!
//! The two counts are taken independently. The pre-scan is a textual
//! heuristic over the raw markdown (it also counts markers inside code
//! blocks), so a mismatch is reported as a warning and nothing more.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ConvertConfig;

const IMAGE_MARKER: &str = "![";
const ATTACHMENT_MARKER: &str = "[[";

/// Counts taken from the raw source tree before conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceCounts {
    pub notes: usize,
    pub images: usize,
    pub attachments: usize,
}

impl SourceCounts {
    /// Add the markers found in one note's raw text
    pub fn add_note(&mut self, content: &str) {
        let lowered = content.to_lowercase();
        self.notes += 1;
        self.images += lowered.matches(IMAGE_MARKER).count();
        self.attachments += lowered.matches(ATTACHMENT_MARKER).count();
    }
}

/// Counts of what actually ended up in the export document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertedCounts {
    pub notes: usize,
    pub images: usize,
}

/// Count notes, image markers and wiki-link markers under `dir`, recursively.
///
/// Unreadable entries are skipped with a warning.
pub fn pre_scan(dir: &Path, config: &ConvertConfig) -> SourceCounts {
    let mut counts = SourceCounts::default();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry during pre-scan: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !config.is_markdown(entry.path()) {
            continue;
        }

        match fs::read(entry.path()) {
            Ok(bytes) => counts.add_note(&String::from_utf8_lossy(&bytes)),
            Err(e) => warn!(
                "Could not read {} during pre-scan: {}",
                entry.path().display(),
                e
            ),
        }
    }

    debug!("Pre-scan of {}: {:?}", dir.display(), counts);
    counts
}

/// Result of comparing the two passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountComparison {
    pub source: SourceCounts,
    pub converted: ConvertedCounts,
}

impl CountComparison {
    pub fn new(source: SourceCounts, converted: ConvertedCounts) -> Self {
        Self { source, converted }
    }

    pub fn notes_match(&self) -> bool {
        self.source.notes == self.converted.notes
    }

    pub fn images_match(&self) -> bool {
        self.source.images == self.converted.images
    }

    pub fn is_consistent(&self) -> bool {
        self.notes_match() && self.images_match()
    }

    /// Human-readable mismatch descriptions, empty when consistent
    pub fn mismatches(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.notes_match() {
            out.push(format!(
                "notes: {} in source, {} written",
                self.source.notes, self.converted.notes
            ));
        }
        if !self.images_match() {
            out.push(format!(
                "images: {} in source, {} embedded",
                self.source.images, self.converted.images
            ));
        }
        out
    }
}
