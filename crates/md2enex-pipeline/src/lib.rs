//! Markdown directory -> ENEX export pipeline
//!
//! ## Architecture
//!
//! - `source`: discovers and reads markdown notes
//! - `assembler`: builds one `ExportRecord` per note via md2enex-content
//! - `document`: aggregates records and serializes the `.enex` file
//! - `verify`: independent pre-scan and post-conversion counts
//! - `note_pipeline`: drives the stages and owns the failure-tolerant loop
//!
//! ## Usage
//!
//! ```rust,ignore
//! use md2enex_pipeline::{ConversionPipeline, ConvertConfig, RunContext};
//!
//! let pipeline = ConversionPipeline::new(ConvertConfig::default(), RunContext::new());
//! let report = pipeline.run(&dir, &output, &mut std::io::stdout())?;
//! ```

pub mod assembler;
pub mod config;
pub mod document;
pub mod error;
pub mod note_pipeline;
pub mod source;
pub mod verify;

pub use assembler::{format_enex_date, AssembledNote, ExportRecord, NoteAssembler};
pub use config::{
    ConvertConfig, RunContext, APP_NAME, APP_VERSION, DEFAULT_OUTPUT, ENEX_DOCTYPE,
};
pub use document::ExportDocument;
pub use error::{AssemblyError, PipelineError, Result};
pub use note_pipeline::*;
pub use source::{list_markdown_files, SourceNote};
pub use verify::{pre_scan, ConvertedCounts, CountComparison, SourceCounts};
