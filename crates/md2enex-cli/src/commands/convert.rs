use anyhow::{Context, Result};
use md2enex_pipeline::{ConversionPipeline, ConvertConfig, PipelineError, RunContext, RunStatus};
use std::io;
use tracing::error;

use super::Outcome;
use crate::cli::ConvertArgs;

/// Apply command-line overrides on top of file/default settings
pub fn apply_overrides(mut config: ConvertConfig, args: &ConvertArgs) -> ConvertConfig {
    if args.no_images {
        config.embed_images = false;
    }
    if args.keep_heading {
        config.drop_leading_heading = false;
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    config
}

pub fn execute(config: ConvertConfig, args: ConvertArgs) -> Result<Outcome> {
    let config = apply_overrides(config, &args);
    let output = config.output.clone();

    let pipeline = ConversionPipeline::new(config, RunContext::new());
    let stdout = io::stdout();
    let mut console = stdout.lock();

    match pipeline.run(&args.directory, &output, &mut console) {
        Ok(report) => match report.status() {
            RunStatus::Success => Ok(Outcome::Success),
            RunStatus::NothingConverted => {
                error!("No notes converted from {}", args.directory.display());
                Ok(Outcome::NothingConverted)
            }
        },
        Err(PipelineError::NoMarkdownFiles { dir }) => {
            eprintln!("No markdown files found in {}", dir.display());
            Ok(Outcome::NoMarkdownFiles)
        }
        Err(e) => Err(e).with_context(|| {
            format!(
                "Failed to convert {} into {}",
                args.directory.display(),
                output.display()
            )
        }),
    }
}
