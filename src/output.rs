//! Report Rendering
//!
//! Turns [`ValidationResults`] into the text written to stdout: human-readable
//! violation lines with a summary, a JSON document, or a one-line summary.

use serde::Serialize;
use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::validator::{
    FileValidationResult, PerformanceMetrics, ValidationResults, ValidationStatus,
};

/// Output formatter for validation results
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_colors: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    success: bool,
    #[serde(flatten)]
    results: &'a ValidationResults,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormat) -> Self {
        Self {
            verbosity,
            format,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Disable ANSI colors regardless of the terminal
    pub fn without_colors(mut self) -> Self {
        self.show_colors = false;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Render results in the configured format
    pub fn render(&self, results: &ValidationResults) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.format_results(results)),
            OutputFormat::Json => self.format_json(results),
            OutputFormat::Summary => Ok(self.format_summary_line(results)),
        }
    }

    pub fn format_results(&self, results: &ValidationResults) -> String {
        let mut output = String::new();

        match self.verbosity {
            VerbosityLevel::Quiet => {
                // Bare violation lines plus anything that kept a file from being checked
                for file_result in &results.file_results {
                    for violation in &file_result.violations {
                        output.push_str(&format!("{}\n", violation));
                    }
                    let path = file_result.path.display();
                    match &file_result.status {
                        ValidationStatus::NoRecords => {
                            output.push_str(&format!("{}: no records found\n", path));
                        }
                        ValidationStatus::Error { message } => {
                            output.push_str(&format!("{}: {}\n", path, message));
                        }
                        ValidationStatus::Skipped { reason } => {
                            output.push_str(&format!("{}: skipped ({})\n", path, reason));
                        }
                        ValidationStatus::Valid | ValidationStatus::Invalid { .. } => {}
                    }
                }
            }
            VerbosityLevel::Normal | VerbosityLevel::Verbose | VerbosityLevel::Debug => {
                for file_result in &results.file_results {
                    if file_result.status.is_valid() && self.verbosity < VerbosityLevel::Verbose {
                        continue;
                    }
                    output.push_str(&self.format_file_result(file_result));
                    output.push('\n');
                }

                if !output.is_empty() {
                    output.push('\n');
                }
                output.push_str(&self.format_summary(results));
            }
        }

        output
    }

    /// Status line for one file, followed by its violation lines
    pub fn format_file_result(&self, result: &FileValidationResult) -> String {
        let path_display = result.path.display();
        let duration_str = format_duration(result.duration);

        match &result.status {
            ValidationStatus::Valid => {
                format!(
                    "{}  {} ({}) - {} record{}",
                    self.colorize("✓ VALID", "32"),
                    path_display,
                    duration_str,
                    result.record_count,
                    plural(result.record_count)
                )
            }
            ValidationStatus::Invalid { violation_count } => {
                let mut output = format!(
                    "{}  {} ({}) - {} violation{} in {} record{}",
                    self.colorize("✗ INVALID", "31"),
                    path_display,
                    duration_str,
                    violation_count,
                    plural(*violation_count),
                    result.record_count,
                    plural(result.record_count)
                );

                for violation in &result.violations {
                    output.push_str(&format!("\n{}", violation));
                }
                output
            }
            ValidationStatus::NoRecords => {
                format!(
                    "{}  {} ({}) - no records found",
                    self.colorize("∅ EMPTY", "35"),
                    path_display,
                    duration_str
                )
            }
            ValidationStatus::Error { message } => {
                format!(
                    "{}  {} ({}) - {}",
                    self.colorize("⚠ ERROR", "33"),
                    path_display,
                    duration_str,
                    message
                )
            }
            ValidationStatus::Skipped { reason } => {
                format!(
                    "{}  {} - {}",
                    self.colorize("- SKIPPED", "36"),
                    path_display,
                    reason
                )
            }
        }
    }

    fn format_summary(&self, results: &ValidationResults) -> String {
        let mut output = String::new();
        output.push_str("Validation Summary:\n");
        output.push_str(&format!("  Total files: {}\n", results.total_files));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            results.valid_files
        ));

        if results.invalid_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                results.invalid_files
            ));
        }
        if results.no_record_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("No records:", "35"),
                results.no_record_files
            ));
        }
        if results.error_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                results.error_files
            ));
        }
        if results.skipped_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Skipped:", "36"),
                results.skipped_files
            ));
        }

        output.push_str(&format!("  Records checked: {}\n", results.total_records));
        output.push_str(&format!("  Violations: {}\n", results.total_violations));
        output.push_str(&format!("  Success rate: {:.1}%\n", results.success_rate()));
        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(results.performance_metrics.total_duration)
        ));

        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&self.format_performance_metrics(&results.performance_metrics));
        }

        output
    }

    fn format_performance_metrics(&self, metrics: &PerformanceMetrics) -> String {
        let mut output = String::new();
        output.push_str("\nPerformance Metrics:\n");
        output.push_str(&format!(
            "  Throughput: {:.1} files/sec, {:.1} records/sec\n",
            metrics.throughput_files_per_second, metrics.throughput_records_per_second
        ));
        output.push_str(&format!(
            "  Concurrent validations: {}\n",
            metrics.concurrent_validations
        ));

        if self.verbosity == VerbosityLevel::Debug {
            output.push_str(&format!(
                "  Discovery: {}\n",
                format_duration(metrics.discovery_duration)
            ));
            output.push_str(&format!(
                "  Validation: {}\n",
                format_duration(metrics.validation_duration)
            ));
            output.push_str(&format!("  Peak memory: {} MB\n", metrics.peak_memory_mb));
        }
        output
    }

    /// Single line of counts, for scripts and CI logs
    pub fn format_summary_line(&self, results: &ValidationResults) -> String {
        format!(
            concat!(
                "files={} valid={} invalid={} no_records={} errors={} skipped={} ",
                "records={} violations={}\n"
            ),
            results.total_files,
            results.valid_files,
            results.invalid_files,
            results.no_record_files,
            results.error_files,
            results.skipped_files,
            results.total_records,
            results.total_violations
        )
    }

    pub fn format_json(&self, results: &ValidationResults) -> serde_json::Result<String> {
        let report = JsonReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            success: results.all_valid(),
            results,
        };
        let mut json = serde_json::to_string_pretty(&report)?;
        json.push('\n');
        Ok(json)
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DocumentReport;
    use crate::error::ValidationError;
    use crate::violation::{FieldPath, RecordViolation, Violation};
    use std::path::PathBuf;

    fn violation(record_id: &str, index: usize, field: &str) -> RecordViolation {
        RecordViolation {
            record_id: record_id.to_string(),
            record_index: index,
            violation: Violation::missing(FieldPath::root().child(field)),
        }
    }

    fn create_test_results() -> ValidationResults {
        ValidationResults::aggregate(vec![
            FileValidationResult::from_report(
                PathBuf::from("good.xml"),
                DocumentReport {
                    record_count: 2,
                    violations: Vec::new(),
                },
                Duration::from_millis(3),
            ),
            FileValidationResult::from_report(
                PathBuf::from("bad.xml"),
                DocumentReport {
                    record_count: 3,
                    violations: vec![violation("T1", 0, "amount"), violation("T3", 2, "payee")],
                },
                Duration::from_millis(4),
            ),
            FileValidationResult::error(
                PathBuf::from("broken.xml"),
                ValidationError::Config("unreadable".to_string()),
                Duration::from_millis(1),
            ),
        ])
    }

    fn output(verbosity: VerbosityLevel, format: OutputFormat) -> Output {
        Output::new(verbosity, format).without_colors()
    }

    #[test]
    fn test_human_output_lists_violations_and_summary() {
        let formatted = output(VerbosityLevel::Normal, OutputFormat::Human)
            .render(&create_test_results())
            .unwrap();

        assert!(formatted.contains("✗ INVALID  bad.xml"));
        assert!(formatted.contains("\nT1: Missing tag - amount\nT3: Missing tag - payee"));
        assert!(formatted.contains("⚠ ERROR  broken.xml"));
        assert!(!formatted.contains("good.xml"));
        assert!(formatted.contains("Validation Summary:"));
        assert!(formatted.contains("  Violations: 2\n"));
        assert!(!formatted.contains("Performance Metrics"));
    }

    #[test]
    fn test_verbose_output_includes_valid_files() {
        let formatted = output(VerbosityLevel::Verbose, OutputFormat::Human)
            .format_results(&create_test_results());

        assert!(formatted.contains("✓ VALID  good.xml (3ms) - 2 records"));
        assert!(formatted.contains("Performance Metrics"));
    }

    #[test]
    fn test_quiet_output_is_bare_lines() {
        let formatted = output(VerbosityLevel::Quiet, OutputFormat::Human)
            .format_results(&create_test_results());

        assert_eq!(
            formatted,
            "T1: Missing tag - amount\n\
             T3: Missing tag - payee\n\
             broken.xml: Configuration error: unreadable\n"
        );
    }

    #[test]
    fn test_quiet_output_reports_unchecked_files() {
        let results = ValidationResults::aggregate(vec![
            FileValidationResult::no_records(PathBuf::from("empty.xml"), Duration::ZERO),
            FileValidationResult::skipped(PathBuf::from("later.xml"), "fail-fast"),
        ]);

        let formatted = output(VerbosityLevel::Quiet, OutputFormat::Human).format_results(&results);

        assert!(!results.all_valid());
        assert_eq!(
            formatted,
            "empty.xml: no records found\nlater.xml: skipped (fail-fast)\n"
        );
    }

    #[test]
    fn test_summary_line() {
        let formatted = output(VerbosityLevel::Normal, OutputFormat::Summary)
            .render(&create_test_results())
            .unwrap();

        assert_eq!(
            formatted,
            "files=3 valid=1 invalid=1 no_records=0 errors=1 skipped=0 records=5 violations=2\n"
        );
    }

    #[test]
    fn test_json_output() {
        let formatted = output(VerbosityLevel::Normal, OutputFormat::Json)
            .render(&create_test_results())
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["total_files"], 3);
        assert!(value["generated_at"].is_string());

        let bad = &value["file_results"][1];
        assert_eq!(bad["status"], "invalid");
        assert_eq!(bad["violation_count"], 2);
        assert_eq!(bad["violations"][0]["record_id"], "T1");
        assert_eq!(bad["violations"][0]["kind"], "missing_field");
        assert_eq!(bad["violations"][0]["path"], serde_json::json!(["amount"]));
    }

    #[test]
    fn test_empty_results_summary() {
        let formatted = output(VerbosityLevel::Normal, OutputFormat::Human)
            .format_results(&ValidationResults::aggregate(Vec::new()));
        assert!(formatted.starts_with("Validation Summary:"));
        assert!(formatted.contains("Total files: 0"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30.0s");
    }
}
