//! Conversion Pipeline Driver
//!
//! Runs one directory of markdown notes through to a single `.enex` file.
//!
//! ## Stages
//!
//! 1. **Scanning**: recursive pre-scan counts, then the sorted, non-recursive
//!    list of notes to convert. No notes is fatal.
//! 2. **PerFileLoop**: each note is assembled in order. A failure becomes a
//!    `NoteOutcome::Failed` entry and the loop moves on.
//! 3. **Aggregating**: the export document is serialized and written once.
//! 4. **Reporting**: pre-scan vs. converted counts, skipped files, summary.
//! 5. **Done**: `RunStatus` tells the caller whether anything was written.
//!
//! Console lines (the user-facing report) go to the writer passed to `run`;
//! diagnostics go through `tracing`.

use md2enex_content::ContentTransformer;
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::assembler::{AssembledNote, NoteAssembler};
use crate::config::{ConvertConfig, RunContext};
use crate::document::ExportDocument;
use crate::error::{PipelineError, Result};
use crate::source::list_markdown_files;
use crate::verify::{pre_scan, ConvertedCounts, CountComparison, SourceCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Scanning,
    PerFileLoop,
    Aggregating,
    Reporting,
    Done,
}

/// A note that could not be assembled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedNote {
    pub path: PathBuf,
    pub reason: String,
}

/// Per-note result threaded through the conversion loop
#[derive(Debug)]
pub enum NoteOutcome {
    Converted(AssembledNote),
    Failed(FailedNote),
}

/// Overall outcome once the document has been written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// At least one note was written
    Success,
    /// Markdown files existed but none converted
    NothingConverted,
}

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub output: PathBuf,
    pub source: SourceCounts,
    pub converted: ConvertedCounts,
    pub failures: Vec<FailedNote>,
}

impl ConversionReport {
    pub fn comparison(&self) -> CountComparison {
        CountComparison::new(self.source, self.converted)
    }

    pub fn notes_written(&self) -> usize {
        self.converted.notes
    }

    pub fn status(&self) -> RunStatus {
        if self.converted.notes > 0 {
            RunStatus::Success
        } else {
            RunStatus::NothingConverted
        }
    }
}

pub struct ConversionPipeline {
    config: ConvertConfig,
    context: RunContext,
    transformer: ContentTransformer,
}

impl ConversionPipeline {
    pub fn new(config: ConvertConfig, context: RunContext) -> Self {
        let transformer = ContentTransformer::new(config.transform_options());
        Self {
            config,
            context,
            transformer,
        }
    }

    /// Replace the content transformer (custom converter or image resolver)
    pub fn with_transformer(mut self, transformer: ContentTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Convert the markdown notes directly inside `dir` into `output`.
    ///
    /// # Returns
    ///
    /// - `Ok(report)` once the document was written, even if every note failed
    ///   (check `report.status()`)
    /// - `Err(NoMarkdownFiles)` when `dir` holds no notes; nothing is written
    /// - `Err(...)` for directory, serialization or write failures
    pub fn run(&self, dir: &Path, output: &Path, console: &mut dyn Write) -> Result<ConversionReport> {
        debug!("Stage {:?}: {}", PipelineStage::Scanning, dir.display());
        let source = pre_scan(dir, &self.config);
        echo(
            console,
            format_args!(
                "Source directory contains: {} notes, {} images, and {} attachments.",
                source.notes, source.images, source.attachments
            ),
        )?;

        let files = list_markdown_files(dir, &self.config)?;
        if files.is_empty() {
            return Err(PipelineError::NoMarkdownFiles {
                dir: dir.to_path_buf(),
            });
        }

        debug!("Stage {:?}: {} file(s)", PipelineStage::PerFileLoop, files.len());
        let assembler = NoteAssembler::new(&self.transformer, &self.context);
        let mut document = ExportDocument::new(&self.context);
        let mut converted = ConvertedCounts::default();
        let mut failures = Vec::new();

        for path in &files {
            match convert_note(&assembler, path) {
                NoteOutcome::Converted(note) => {
                    converted.notes += 1;
                    converted.images += note.embedded_images.len();
                    document.push(note.record);
                }
                NoteOutcome::Failed(failed) => failures.push(failed),
            }
        }

        debug!("Stage {:?}: {}", PipelineStage::Aggregating, output.display());
        document.write_to(output)?;

        debug!("Stage {:?}", PipelineStage::Reporting);
        let report = ConversionReport {
            output: output.to_path_buf(),
            source,
            converted,
            failures,
        };
        self.print_report(&report, console)?;

        debug!("Stage {:?}: {:?}", PipelineStage::Done, report.status());
        Ok(report)
    }

    fn print_report(&self, report: &ConversionReport, console: &mut dyn Write) -> Result<()> {
        echo(
            console,
            format_args!(
                "Output ENEX file contains: {} notes, {} images embedded.",
                report.converted.notes, report.converted.images
            ),
        )?;

        let comparison = report.comparison();
        if comparison.is_consistent() {
            echo(console, "All notes and images were successfully processed!")?;
        } else {
            for mismatch in comparison.mismatches() {
                warn!("Count mismatch: {}", mismatch);
            }
            echo(
                console,
                "Warning: Some notes or images may not have been processed correctly. Please verify manually.",
            )?;
        }

        if !report.failures.is_empty() {
            warn!(
                "{} file(s) were skipped and need to be cleaned up manually and reimported",
                report.failures.len()
            );
            echo(console, "Skipped files:")?;
            for failed in &report.failures {
                echo(
                    console,
                    format_args!("  {}: {}", failed.path.display(), failed.reason),
                )?;
            }
        }

        match report.status() {
            RunStatus::Success => echo(
                console,
                format_args!(
                    "Successfully wrote {} markdown files to {}",
                    report.notes_written(),
                    report.output.display()
                ),
            ),
            RunStatus::NothingConverted => echo(console, "Error - no files written."),
        }
    }
}

/// Assemble one note; failures are values, never early returns
pub fn convert_note(assembler: &NoteAssembler<'_>, path: &Path) -> NoteOutcome {
    info!("Processing note: {}", path.display());
    match assembler.assemble_file(path) {
        Ok(note) => NoteOutcome::Converted(note),
        Err(e) => {
            warn!("Parsing error occurred with file {}: {}", path.display(), e);
            NoteOutcome::Failed(FailedNote {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}

fn echo(console: &mut dyn Write, line: impl Display) -> Result<()> {
    writeln!(console, "{}", line).map_err(|e| PipelineError::io("<console>", e))
}
