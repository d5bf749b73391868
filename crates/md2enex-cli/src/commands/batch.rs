//! Multi-folder conversion
//!
//! Every immediate subdirectory of the root is converted on its own into
//! `<out-dir>/<folder>.enex`. Notes that fail to convert, and folders that
//! fail as a whole, are collected into a CSV issues file.

use anyhow::{Context, Result};
use md2enex_pipeline::{
    list_markdown_files, ConversionPipeline, ConversionReport, ConvertConfig, RunContext,
};
use std::fmt::Display;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::Outcome;
use crate::cli::BatchArgs;

const DEFAULT_ISSUES_FILE: &str = "enex_file_issues.csv";

/// One row of the issues CSV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    #[serde(rename = "Folder")]
    pub folder: String,
    #[serde(rename = "Markdown File")]
    pub markdown_file: String,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Error Details")]
    pub details: String,
    #[serde(rename = "File Size (KB)")]
    pub size_kb: String,
    #[serde(rename = "Note Count in ENEX")]
    pub notes_in_enex: usize,
}

/// Totals across all folders of a batch
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    /// `<folder> - <n> notes` for each folder holding markdown
    pub folders_with_markdown: Vec<String>,
    /// `<file>.enex - <n> notes` for each folder written with at least one note
    pub converted: Vec<String>,
    pub total_markdown: usize,
    pub total_converted: usize,
    pub issues: Vec<IssueRow>,
}

impl BatchSummary {
    pub fn outcome(&self) -> Outcome {
        if self.folders_with_markdown.is_empty() {
            Outcome::NoMarkdownFiles
        } else if self.converted.is_empty() {
            Outcome::NothingConverted
        } else {
            Outcome::Success
        }
    }

    fn record_folder_error(&mut self, folder: &str, error: impl Display) {
        self.issues.push(IssueRow {
            folder: folder.to_string(),
            markdown_file: String::new(),
            error: "Conversion failed.".to_string(),
            details: error.to_string(),
            size_kb: String::new(),
            notes_in_enex: 0,
        });
    }

    fn record_report(&mut self, folder: &str, report: &ConversionReport) {
        self.total_converted += report.notes_written();
        if report.notes_written() > 0 {
            let file = report
                .output
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            self.converted
                .push(format!("{} - {} notes", file, report.notes_written()));
        }

        for failed in &report.failures {
            self.issues.push(IssueRow {
                folder: folder.to_string(),
                markdown_file: failed
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                error: "Conversion failed.".to_string(),
                details: failed.reason.clone(),
                size_kb: file_size_kb(&failed.path),
                notes_in_enex: report.notes_written(),
            });
        }
    }
}

pub fn execute(config: ConvertConfig, args: BatchArgs) -> Result<Outcome> {
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let stdout = io::stdout();
    let mut console = stdout.lock();
    let summary = run_batch(&config, &args.root, &args.out_dir, &mut console)?;

    let issues_path = args
        .issues
        .unwrap_or_else(|| args.out_dir.join(DEFAULT_ISSUES_FILE));
    write_issues(&issues_path, &summary.issues)?;

    print_summary(&summary, &issues_path, &mut console)?;
    Ok(summary.outcome())
}

/// Convert each subdirectory of `root`; one failing folder never stops the rest
pub fn run_batch(
    config: &ConvertConfig,
    root: &Path,
    out_dir: &Path,
    console: &mut dyn Write,
) -> Result<BatchSummary> {
    run_batch_with(config, root, out_dir, console, list_markdown_files)
}

/// `run_batch` with the per-folder note listing supplied by the caller
fn run_batch_with<L>(
    config: &ConvertConfig,
    root: &Path,
    out_dir: &Path,
    console: &mut dyn Write,
    list_notes: L,
) -> Result<BatchSummary>
where
    L: Fn(&Path, &ConvertConfig) -> md2enex_pipeline::Result<Vec<PathBuf>>,
{
    let context = RunContext::new();
    let mut summary = BatchSummary::default();

    for folder in subdirectories(root)? {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        writeln!(console, "Processing folder: {}", name)?;

        let notes = match list_notes(&folder, config) {
            Ok(notes) => notes,
            Err(e) => {
                warn!("Could not list notes in {}: {}", name, e);
                writeln!(console, "Errors found in {}. Check the CSV for details.", name)?;
                summary.record_folder_error(&name, e);
                continue;
            }
        };
        if notes.is_empty() {
            writeln!(console, "No markdown notes found in {}", name)?;
            continue;
        }

        summary.total_markdown += notes.len();
        summary
            .folders_with_markdown
            .push(format!("{} - {} notes", name, notes.len()));

        let output = out_dir.join(format!("{}.enex", name));
        let pipeline = ConversionPipeline::new(config.clone(), context.clone());

        match pipeline.run(&folder, &output, console) {
            Ok(report) => {
                if report.notes_written() == 0 {
                    writeln!(console, "Errors found in {}. Check the CSV for details.", name)?;
                }
                summary.record_report(&name, &report);
            }
            Err(e) => {
                warn!("Folder {} failed: {}", name, e);
                writeln!(console, "Errors found in {}. Check the CSV for details.", name)?;
                summary.record_folder_error(&name, e);
            }
        }
    }

    Ok(summary)
}

/// Immediate subdirectories, sorted case-insensitively. Only an unreadable
/// root is an error; unreadable entries are skipped.
fn subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("Failed to read {}", root.display()))? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                continue;
            }
        };
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort_by_cached_key(|p| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    Ok(dirs)
}

fn file_size_kb(path: &Path) -> String {
    fs::metadata(path)
        .map(|m| format!("{:.2}", m.len() as f64 / 1024.0))
        .unwrap_or_default()
}

/// Write the issues CSV, header included even when there are no issues
pub fn write_issues(path: &Path, issues: &[IssueRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    if issues.is_empty() {
        writer.write_record([
            "Folder",
            "Markdown File",
            "Error",
            "Error Details",
            "File Size (KB)",
            "Note Count in ENEX",
        ])?;
    }
    for issue in issues {
        writer.serialize(issue)?;
    }
    writer.flush()?;

    info!("Wrote {} issue(s) to {}", issues.len(), path.display());
    Ok(())
}

fn print_summary(summary: &BatchSummary, issues_path: &Path, console: &mut dyn Write) -> Result<()> {
    writeln!(console)?;
    writeln!(console, "--- Conversion Summary ---")?;
    writeln!(
        console,
        "Folders with markdown files: {}",
        summary.folders_with_markdown.len()
    )?;
    writeln!(
        console,
        "Folders converted to enex files: {}",
        summary.converted.len()
    )?;

    writeln!(console)?;
    writeln!(console, "Folders with notes:")?;
    for detail in &summary.folders_with_markdown {
        writeln!(console, "{}", detail)?;
    }

    writeln!(console)?;
    writeln!(console, "List of files converted to enex:")?;
    for converted in &summary.converted {
        writeln!(console, "{}", converted)?;
    }

    writeln!(console)?;
    writeln!(console, "Total markdown notes: {}", summary.total_markdown)?;
    writeln!(console, "Total enex notes: {}", summary.total_converted)?;
    writeln!(
        console,
        "Problematic files (if any) have been logged to: {}",
        issues_path.display()
    )?;
    Ok(())
}
