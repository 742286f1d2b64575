//! Concurrent Validation Engine
//!
//! Validates many record documents against one schema:
//! - **Async I/O**: file discovery and document reads run on the tokio runtime
//! - **Blocking CPU work**: parsing and record validation run on `spawn_blocking` threads
//! - **Bounded concurrency**: a semaphore caps the number of files in flight
//! - **Ordered results**: `try_join_all` returns file results in discovery order
//!
//! Within a file, records may additionally be validated on the rayon pool when
//! [`RecordOptions::parallel`] is set.

use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::driver::{DocumentReport, RecordOptions, validate_document};
use crate::error::{Result, ValidationError};
use crate::file_discovery::FileDiscovery;
use crate::parser::{DocumentFormat, parse_document};
use crate::schema::Schema;
use crate::violation::RecordViolation;

/// Validation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Number of files validated concurrently
    pub max_concurrent_validations: usize,
    /// Timeout for validating a single file
    pub validation_timeout: Duration,
    /// Skip remaining files once one file fails
    pub fail_fast: bool,
    /// Collect process-level performance metrics
    pub collect_metrics: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_validations: num_cpus::get(),
            validation_timeout: Duration::from_secs(30),
            fail_fast: false,
            collect_metrics: true,
        }
    }
}

/// Status of a single file validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Every record carried all mandatory fields with consistent counts
    Valid,
    /// At least one record produced a violation
    Invalid { violation_count: usize },
    /// The document contained no records to check
    NoRecords,
    /// The document could not be read or parsed
    Error { message: String },
    /// The file was not validated (e.g., fail-fast stopped the run)
    Skipped { reason: String },
}

impl ValidationStatus {
    /// Check if the validation was successful
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Valid)
    }

    /// Check if any record had violations
    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationStatus::Invalid { .. })
    }

    /// Check if the document had no records
    pub fn is_no_records(&self) -> bool {
        matches!(self, ValidationStatus::NoRecords)
    }

    /// Check if an error occurred
    pub fn is_error(&self) -> bool {
        matches!(self, ValidationStatus::Error { .. })
    }

    /// Check if the file was skipped
    pub fn is_skipped(&self) -> bool {
        matches!(self, ValidationStatus::Skipped { .. })
    }
}

/// Result of validating a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileValidationResult {
    /// Path to the validated file
    pub path: PathBuf,
    /// Validation status
    #[serde(flatten)]
    pub status: ValidationStatus,
    /// Number of records found in the document
    pub record_count: usize,
    /// Violations in record order
    pub violations: Vec<RecordViolation>,
    /// Duration of validation
    pub duration: Duration,
}

impl FileValidationResult {
    /// Build a result from a driver report
    pub fn from_report(path: PathBuf, report: DocumentReport, duration: Duration) -> Self {
        let status = if report.violations.is_empty() {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Invalid {
                violation_count: report.violations.len(),
            }
        };

        Self {
            path,
            status,
            record_count: report.record_count,
            violations: report.violations,
            duration,
        }
    }

    /// Create a result for a document without records
    pub fn no_records(path: PathBuf, duration: Duration) -> Self {
        Self {
            path,
            status: ValidationStatus::NoRecords,
            record_count: 0,
            violations: Vec::new(),
            duration,
        }
    }

    /// Create a new error validation result
    pub fn error(path: PathBuf, error: ValidationError, duration: Duration) -> Self {
        Self {
            path,
            status: ValidationStatus::Error {
                message: error.to_string(),
            },
            record_count: 0,
            violations: Vec::new(),
            duration,
        }
    }

    /// Create a new skipped validation result
    pub fn skipped(path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            path,
            status: ValidationStatus::Skipped {
                reason: reason.into(),
            },
            record_count: 0,
            violations: Vec::new(),
            duration: Duration::ZERO,
        }
    }
}

/// Progress update for validation
#[derive(Debug, Clone)]
pub struct ValidationProgress {
    /// File most recently finished
    pub current_file: Option<PathBuf>,
    /// Number of files completed
    pub completed: usize,
    /// Total number of files to process
    pub total: usize,
    /// Current phase of validation
    pub phase: ValidationPhase,
}

/// Phase of validation process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPhase {
    /// Discovering files
    Discovery,
    /// Validating files
    Validation,
    /// Aggregating results
    Aggregation,
    /// Complete
    Complete,
}

/// Performance metrics for validation
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceMetrics {
    /// Total wall-clock duration
    pub total_duration: Duration,
    /// File discovery duration
    pub discovery_duration: Duration,
    /// Validation duration
    pub validation_duration: Duration,
    /// Average wall-clock time per file
    pub average_time_per_file: Duration,
    /// Files processed per second
    pub throughput_files_per_second: f64,
    /// Records checked per second
    pub throughput_records_per_second: f64,
    /// Peak memory usage in MB (0 when unavailable)
    pub peak_memory_mb: u64,
    /// Number of concurrent validations
    pub concurrent_validations: usize,
}

/// Aggregated results of validating multiple files
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResults {
    /// Total number of files processed
    pub total_files: usize,
    /// Number of valid files
    pub valid_files: usize,
    /// Number of files with violations
    pub invalid_files: usize,
    /// Number of files without records
    pub no_record_files: usize,
    /// Number of files with errors
    pub error_files: usize,
    /// Number of skipped files
    pub skipped_files: usize,
    /// Records checked across all files
    pub total_records: usize,
    /// Violations across all files
    pub total_violations: usize,
    /// Sum of per-file durations
    pub total_duration: Duration,
    /// Average duration per file
    pub average_duration: Duration,
    /// Individual file results in discovery order
    pub file_results: Vec<FileValidationResult>,
    /// Performance metrics
    pub performance_metrics: PerformanceMetrics,
}

impl ValidationResults {
    /// Aggregate individual file results into summary
    pub fn aggregate(file_results: Vec<FileValidationResult>) -> Self {
        let total_files = file_results.len();
        let mut valid_files = 0;
        let mut invalid_files = 0;
        let mut no_record_files = 0;
        let mut error_files = 0;
        let mut skipped_files = 0;
        let mut total_records = 0;
        let mut total_violations = 0;
        let mut total_duration = Duration::ZERO;

        for result in &file_results {
            match result.status {
                ValidationStatus::Valid => valid_files += 1,
                ValidationStatus::Invalid { .. } => invalid_files += 1,
                ValidationStatus::NoRecords => no_record_files += 1,
                ValidationStatus::Error { .. } => error_files += 1,
                ValidationStatus::Skipped { .. } => skipped_files += 1,
            }

            total_records += result.record_count;
            total_violations += result.violations.len();
            total_duration += result.duration;
        }

        let average_duration = if total_files > 0 {
            total_duration / total_files as u32
        } else {
            Duration::ZERO
        };

        let performance_metrics = PerformanceMetrics {
            total_duration,
            validation_duration: total_duration,
            average_time_per_file: average_duration,
            throughput_files_per_second: per_second(total_files, total_duration),
            throughput_records_per_second: per_second(total_records, total_duration),
            concurrent_validations: 1,
            ..PerformanceMetrics::default()
        };

        Self {
            total_files,
            valid_files,
            invalid_files,
            no_record_files,
            error_files,
            skipped_files,
            total_records,
            total_violations,
            total_duration,
            average_duration,
            file_results,
            performance_metrics,
        }
    }

    /// Create results with detailed performance metrics
    pub fn with_metrics(
        file_results: Vec<FileValidationResult>,
        performance_metrics: PerformanceMetrics,
    ) -> Self {
        let mut results = Self::aggregate(file_results);
        results.performance_metrics = performance_metrics;
        results
    }

    /// True iff at least one file was checked and every file was valid
    pub fn all_valid(&self) -> bool {
        self.valid_files == self.total_files && self.total_files > 0
    }

    /// Check if any file failed to validate cleanly
    pub fn has_errors(&self) -> bool {
        self.error_files > 0 || self.invalid_files > 0 || self.no_record_files > 0
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.valid_files as f64 / self.total_files as f64) * 100.0
        }
    }

    /// All violations, file by file, in record order
    pub fn violations(&self) -> impl Iterator<Item = (&Path, &RecordViolation)> {
        self.file_results.iter().flat_map(|result| {
            result
                .violations
                .iter()
                .map(move |violation| (result.path.as_path(), violation))
        })
    }
}

fn per_second(count: usize, duration: Duration) -> f64 {
    if duration.as_secs_f64() > 0.0 {
        count as f64 / duration.as_secs_f64()
    } else {
        0.0
    }
}

/// Progress callback type for validation updates
pub type ProgressCallback = Arc<dyn Fn(ValidationProgress) + Send + Sync>;

/// Validates record documents concurrently against a single schema.
///
/// Each file gets its own tokio task, gated by a semaphore. Reading is async;
/// parsing and record validation run on the blocking pool.
pub struct ValidationEngine {
    schema: Arc<Schema>,
    options: Arc<RecordOptions>,
    config: ValidationConfig,
}

impl ValidationEngine {
    /// Create a new validation engine
    pub fn new(schema: Arc<Schema>, options: RecordOptions, config: ValidationConfig) -> Self {
        Self {
            schema,
            options: Arc::new(options),
            config,
        }
    }

    /// Validate every document found under `path`
    pub async fn validate_path(
        &self,
        path: &Path,
        file_discovery: &FileDiscovery,
    ) -> Result<ValidationResults> {
        self.validate_path_with_progress(path, file_discovery, None)
            .await
    }

    /// Validate every document found under `path`, reporting progress
    pub async fn validate_path_with_progress(
        &self,
        path: &Path,
        file_discovery: &FileDiscovery,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<ValidationResults> {
        let workflow_start = Instant::now();
        let mut performance_metrics = PerformanceMetrics {
            concurrent_validations: self.config.max_concurrent_validations,
            ..PerformanceMetrics::default()
        };

        // Phase 1: File Discovery
        let discovery_start = Instant::now();
        notify(&progress_callback, None, 0, 0, ValidationPhase::Discovery);

        let files = file_discovery.discover_files(path).await?;
        performance_metrics.discovery_duration = discovery_start.elapsed();
        info!(path = %path.display(), files = files.len(), "discovered documents");

        if files.is_empty() {
            performance_metrics.total_duration = workflow_start.elapsed();
            return Ok(ValidationResults::with_metrics(
                Vec::new(),
                performance_metrics,
            ));
        }

        // Phase 2: Validation
        let validation_start = Instant::now();
        let results = self
            .validate_files_with_progress(files, progress_callback.clone())
            .await?;
        performance_metrics.validation_duration = validation_start.elapsed();

        // Phase 3: Result Aggregation
        notify(
            &progress_callback,
            None,
            results.len(),
            results.len(),
            ValidationPhase::Aggregation,
        );

        let records: usize = results.iter().map(|result| result.record_count).sum();
        performance_metrics.total_duration = workflow_start.elapsed();
        performance_metrics.average_time_per_file =
            performance_metrics.validation_duration / results.len() as u32;
        performance_metrics.throughput_files_per_second =
            per_second(results.len(), performance_metrics.total_duration);
        performance_metrics.throughput_records_per_second =
            per_second(records, performance_metrics.total_duration);

        if self.config.collect_metrics {
            performance_metrics.peak_memory_mb = peak_memory_usage().await;
        }

        let final_results = ValidationResults::with_metrics(results, performance_metrics);

        // Phase 4: Complete
        notify(
            &progress_callback,
            None,
            final_results.total_files,
            final_results.total_files,
            ValidationPhase::Complete,
        );

        Ok(final_results)
    }

    /// Validate a list of files using concurrent async operations
    pub async fn validate_files(&self, files: Vec<PathBuf>) -> Result<Vec<FileValidationResult>> {
        self.validate_files_with_progress(files, None).await
    }

    /// Validate a list of files with progress tracking
    pub async fn validate_files_with_progress(
        &self,
        files: Vec<PathBuf>,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<Vec<FileValidationResult>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let total_files = files.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        // Create a semaphore to limit concurrent validations
        let semaphore = Arc::new(tokio::sync::Semaphore::new(
            self.config.max_concurrent_validations,
        ));

        let validation_tasks: Vec<_> = files
            .into_iter()
            .map(|file_path| {
                let schema = Arc::clone(&self.schema);
                let options = Arc::clone(&self.options);
                let semaphore = Arc::clone(&semaphore);
                let timeout = self.config.validation_timeout;
                let fail_fast = self.config.fail_fast;
                let progress_callback = progress_callback.clone();
                let completed = Arc::clone(&completed);
                let stop = Arc::clone(&stop);

                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.map_err(|_| {
                        ValidationError::Concurrency {
                            details: "Failed to acquire validation semaphore".to_string(),
                        }
                    })?;

                    let validation_result = if fail_fast && stop.load(Ordering::SeqCst) {
                        FileValidationResult::skipped(
                            file_path.clone(),
                            "fail-fast: an earlier file failed validation",
                        )
                    } else {
                        let start = Instant::now();
                        match tokio::time::timeout(
                            timeout,
                            Self::validate_single_file_internal(file_path.clone(), schema, options),
                        )
                        .await
                        {
                            Ok(result) => result,
                            Err(_) => FileValidationResult::error(
                                file_path.clone(),
                                ValidationError::Timeout {
                                    file: file_path.clone(),
                                    timeout_seconds: timeout.as_secs(),
                                },
                                start.elapsed(),
                            ),
                        }
                    };

                    // Set while the permit is held; queued files check it on acquire.
                    if fail_fast && !validation_result.status.is_valid() {
                        stop.store(true, Ordering::SeqCst);
                    }

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    notify(
                        &progress_callback,
                        Some(file_path),
                        done,
                        total_files,
                        ValidationPhase::Validation,
                    );

                    Ok::<FileValidationResult, ValidationError>(validation_result)
                })
            })
            .collect();

        let task_results =
            try_join_all(validation_tasks)
                .await
                .map_err(|e| ValidationError::Concurrency {
                    details: format!("Task join error: {}", e),
                })?;

        task_results.into_iter().collect()
    }

    async fn validate_single_file_internal(
        file_path: PathBuf,
        schema: Arc<Schema>,
        options: Arc<RecordOptions>,
    ) -> FileValidationResult {
        let start_time = Instant::now();

        let content = match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => content,
            Err(e) => return FileValidationResult::error(file_path, e.into(), start_time.elapsed()),
        };

        let format = DocumentFormat::from_path(&file_path);
        let outcome = tokio::task::spawn_blocking(move || -> Result<DocumentReport> {
            let document = parse_document(&content, format)?;
            validate_document(&document, &schema, &options)
        })
        .await;

        let duration = start_time.elapsed();
        let result = match outcome {
            Ok(Ok(report)) => FileValidationResult::from_report(file_path, report, duration),
            Ok(Err(ValidationError::NoRecords { .. })) => {
                FileValidationResult::no_records(file_path, duration)
            }
            Ok(Err(e)) => FileValidationResult::error(file_path, e, duration),
            Err(e) => FileValidationResult::error(
                file_path,
                ValidationError::Concurrency {
                    details: format!("Join error: {}", e),
                },
                duration,
            ),
        };

        debug!(
            path = %result.path.display(),
            status = ?result.status,
            records = result.record_count,
            elapsed_ms = duration.as_millis() as u64,
            "validated file"
        );
        result
    }

    /// Validate a single file
    pub async fn validate_single_file(&self, file_path: &Path) -> FileValidationResult {
        Self::validate_single_file_internal(
            file_path.to_path_buf(),
            Arc::clone(&self.schema),
            Arc::clone(&self.options),
        )
        .await
    }

    /// Get the schema used by this engine
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Get the validation configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }
}

fn notify(
    callback: &Option<ProgressCallback>,
    current_file: Option<PathBuf>,
    completed: usize,
    total: usize,
    phase: ValidationPhase,
) {
    if let Some(callback) = callback {
        callback(ValidationProgress {
            current_file,
            completed,
            total,
            phase,
        });
    }
}

/// Peak resident set size in MB, read from procfs where available
async fn peak_memory_usage() -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = tokio::fs::read_to_string("/proc/self/status").await {
            for line in status.lines() {
                if let Some(rest) = line.strip_prefix("VmHWM:")
                    && let Some(kb) = rest
                        .split_whitespace()
                        .next()
                        .and_then(|kb| kb.parse::<u64>().ok())
                {
                    return kb / 1024;
                }
            }
        }
    }

    0
}
