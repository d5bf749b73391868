use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors (default)
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser)]
#[command(name = "md2enex")]
#[command(
    about = "Converts all markdown files in a directory into a single .enex file for importing to Evernote"
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (TOML with a [convert] table)
    #[arg(short = 'C', long, global = true, env = "MD2ENEX_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Level from the flags; `--log-level` wins over `--verbose`
    pub fn level_filter(&self) -> LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level.into(),
            (None, true) => LevelFilter::DEBUG,
            (None, false) => LevelFilter::WARN,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert the markdown files in one directory into a single .enex file
    Convert(ConvertArgs),

    /// Convert every subdirectory of a root into its own .enex file
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Directory containing the markdown notes
    #[arg(value_parser = existing_dir)]
    pub directory: PathBuf,

    /// Output file name. Existing file will be overwritten [default: export.enex]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Leave image references as links instead of embedding them
    #[arg(long)]
    pub no_images: bool,

    /// Keep a leading `# Title` heading in the note body
    #[arg(long)]
    pub keep_heading: bool,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Directory whose immediate subdirectories are converted
    #[arg(value_parser = existing_dir)]
    pub root: PathBuf,

    /// Directory receiving one <subdirectory>.enex per converted folder
    #[arg(short = 'd', long)]
    pub out_dir: PathBuf,

    /// CSV file listing notes that failed to convert [default: <out-dir>/enex_file_issues.csv]
    #[arg(long)]
    pub issues: Option<PathBuf>,
}

fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("'{}' is not an existing directory", value))
    }
}
