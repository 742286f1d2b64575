use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show violations and the summary
    #[default]
    Normal,
    /// Also show per-file status and timings
    Verbose,
    /// Show all available debugging information
    Debug,
}

impl VerbosityLevel {
    /// Default `tracing` filter directive for this verbosity
    pub fn log_filter(self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "info",
            VerbosityLevel::Debug => "debug",
        }
    }
}

/// Report format written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per violation followed by a summary
    #[default]
    Human,
    /// Machine-readable JSON document
    Json,
    /// Summary counts only
    Summary,
}

/// Check record documents for mandatory fields and consistent counts
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-records")]
#[command(
    about = "Validate records in XML or JSON documents against a mandatory-field schema \
             and declared counts"
)]
#[command(version)]
pub struct Cli {
    /// Path to scan for documents (directory or file)
    #[arg(help = "Directory or file to validate")]
    pub path: PathBuf,

    /// Schema file (TOML or JSON) listing mandatory fields
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Element name of a record under the document root
    #[arg(long = "record-tag")]
    pub record_tag: Option<String>,

    /// Field holding the record identifier used in reports
    #[arg(long = "id-field")]
    pub id_field: Option<String>,

    /// File extensions to process (comma-separated)
    #[arg(
        short = 'e',
        long = "extensions",
        help = "File extensions to process (e.g., 'xml,json')"
    )]
    pub extensions: Option<String>,

    /// Number of files validated concurrently
    #[arg(
        short = 't',
        long = "threads",
        help = "Number of files validated concurrently"
    )]
    pub threads: Option<usize>,

    /// Increase output detail (-v verbose, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable quiet mode (errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Per-file timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Include file patterns (glob syntax)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include_patterns: Vec<String>,

    /// Exclude file patterns (glob syntax)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Show progress indicators
    #[arg(long = "progress")]
    pub progress: bool,

    /// Stop validating further files after the first failing file
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Validate the records of each document in parallel
    #[arg(long = "parallel-records")]
    pub parallel_records: bool,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Extensions given with `-e`, if any
    pub fn get_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_ref().map(|extensions| {
            extensions
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.path.exists() {
            return Err(format!("Path does not exist: {}", self.path.display()));
        }
        if let Some(threads) = self.threads
            && threads == 0
        {
            return Err("Number of threads must be greater than 0".to_string());
        }
        if let Some(timeout) = self.timeout
            && timeout == 0
        {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Verbosity requested on the command line alone
    pub fn verbosity(&self) -> VerbosityLevel {
        match (self.quiet, self.verbose) {
            (true, _) => VerbosityLevel::Quiet,
            (false, 0) => VerbosityLevel::Normal,
            (false, 1) => VerbosityLevel::Verbose,
            (false, _) => VerbosityLevel::Debug,
        }
    }
}
