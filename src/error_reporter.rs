use crate::cli::VerbosityLevel;
use crate::config::ConfigError;
use crate::error::{ParseError, SchemaError, ValidationError};
use crate::validator::{ValidationPhase, ValidationProgress};

/// Reports operational errors and progress on stderr with configurable verbosity
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    show_timestamps: bool,
}

impl ErrorReporter {
    /// Create a new error reporter with specified verbosity
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_timestamps: false,
        }
    }

    /// Prefix messages with a wall-clock timestamp
    pub fn with_timestamps(mut self, show_timestamps: bool) -> Self {
        self.show_timestamps = show_timestamps;
        self
    }

    /// Report an error that aborted the run
    pub fn report_validation_error(&self, error: &ValidationError) {
        eprintln!("{}", self.format_validation_error(error));
    }

    /// Report a configuration error
    pub fn report_config_error(&self, error: &ConfigError) {
        eprintln!("{}", self.format_config_error(error));
    }

    /// Report progress for long-running operations
    pub fn report_progress(&self, progress: &ValidationProgress) {
        if self.verbosity == VerbosityLevel::Quiet
            || progress.phase != ValidationPhase::Validation
            || progress.total == 0
        {
            return;
        }

        eprint!("\r{}", self.format_progress(progress));
        if progress.completed == progress.total {
            eprintln!();
        }
    }

    pub fn format_validation_error(&self, error: &ValidationError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("ERROR: {}", error),
            VerbosityLevel::Normal => self.format_error_normal(error),
            VerbosityLevel::Verbose => self.format_error_verbose(error),
            VerbosityLevel::Debug => self.format_error_debug(error),
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                format!(
                    "Configuration Error: {}\n{}",
                    error,
                    self.get_config_help(error)
                )
            }
            VerbosityLevel::Debug => {
                format!(
                    "Configuration Error: {}\nDebug: {:?}\n{}",
                    error,
                    error,
                    self.get_config_help(error)
                )
            }
        }
    }

    fn format_progress(&self, progress: &ValidationProgress) -> String {
        let percentage = (progress.completed as f64 / progress.total as f64 * 100.0) as u32;
        match (&progress.current_file, self.verbosity >= VerbosityLevel::Verbose) {
            (Some(file), true) => format!(
                "Progress: {}/{} ({}%) - {}",
                progress.completed,
                progress.total,
                percentage,
                file.display()
            ),
            _ => format!(
                "Progress: {}/{} ({}%)",
                progress.completed, progress.total, percentage
            ),
        }
    }

    fn format_error_normal(&self, error: &ValidationError) -> String {
        let timestamp = if self.show_timestamps {
            format!("[{}] ", chrono::Local::now().format("%H:%M:%S"))
        } else {
            String::new()
        };

        format!("{}{}", timestamp, error)
    }

    fn format_error_verbose(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_normal(error);
        if let Some(suggestion) = self.get_suggestion(error) {
            output.push_str("\nSuggestion: ");
            output.push_str(suggestion);
        }
        output
    }

    fn format_error_debug(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_verbose(error);
        output.push_str(&format!("\nDebug Info: {:?}", error));

        output.push_str("\nError Chain:");
        let mut current_error: &dyn std::error::Error = error;
        let mut level = 0;
        while let Some(source) = current_error.source() {
            output.push_str(&format!("\n  {}: {}", level + 1, source));
            current_error = source;
            level += 1;
        }

        output
    }

    fn get_suggestion(&self, error: &ValidationError) -> Option<&'static str> {
        match error {
            ValidationError::Io(_) => Some("Check that the path exists and is readable"),
            ValidationError::Parse(ParseError::Json(_) | ParseError::InvalidJsonRoot) => Some(
                "JSON documents need a single root object; repeated fields must be arrays",
            ),
            ValidationError::Parse(_) => Some("Check that the document is well-formed XML"),
            ValidationError::Schema(SchemaError::UnsupportedFormat(_)) => {
                Some("Schema files must end in .toml or .json")
            }
            ValidationError::Schema(_) => Some(
                "Mark mandatory leaves with `true` and describe nested fields as tables or objects",
            ),
            ValidationError::NoRecords { .. } => {
                Some("Check --record-tag against the element names under the document root")
            }
            ValidationError::Timeout { .. } => Some("Increase --timeout for very large documents"),
            ValidationError::Config(_) | ValidationError::Concurrency { .. } => None,
        }
    }

    fn get_config_help(&self, error: &ConfigError) -> String {
        match error {
            ConfigError::Io(_) => {
                "Check that the configuration file exists and is readable".to_string()
            }
            ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
                "Check the configuration file syntax (TOML/JSON format expected)".to_string()
            }
            ConfigError::Validation(_) => {
                "Fix the value on the command line, in VALIDATE_RECORDS_* variables, \
                 or in the configuration file"
                    .to_string()
            }
            ConfigError::Environment(_) => {
                "Unset or correct the VALIDATE_RECORDS_* environment variable".to_string()
            }
            ConfigError::UnsupportedFormat(_) => {
                "Configuration files must end in .toml or .json".to_string()
            }
        }
    }
}
