//! Integration tests for the file validation workflow
//!
//! These run the engine over the checked-in fixtures and over generated
//! directories, covering status classification, aggregation and fail-fast.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use validate_records::{
    FileDiscovery, RecordOptions, ValidationConfig, ValidationEngine, ValidationPhase,
    ValidationProgress, ValidationStatus,
};

async fn engine(config: ValidationConfig) -> ValidationEngine {
    ValidationEngine::new(
        common::transaction_schema().await,
        RecordOptions::default(),
        config,
    )
}

#[tokio::test]
async fn test_fixture_directories_are_classified() {
    let engine = engine(ValidationConfig::default()).await;
    let discovery = FileDiscovery::new();

    let results = engine
        .validate_path(&common::fixture("xml"), &discovery)
        .await
        .unwrap();

    assert_eq!(results.total_files, 4);
    assert_eq!(results.valid_files, 1);
    assert_eq!(results.invalid_files, 1);
    assert_eq!(results.no_record_files, 1);
    assert_eq!(results.error_files, 1);
    assert_eq!(results.total_records, 4);
    assert_eq!(results.total_violations, 4);
    assert!(!results.all_valid());

    // Sorted discovery: invalid, malformed, no_records, valid
    let names: Vec<String> = results
        .file_results
        .iter()
        .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["invalid.xml", "malformed.xml", "no_records.xml", "valid.xml"]
    );
    assert_eq!(
        results.file_results[0].status,
        ValidationStatus::Invalid { violation_count: 4 }
    );
    assert!(results.file_results[1].status.is_error());
    assert!(results.file_results[2].status.is_no_records());
    assert!(results.file_results[3].status.is_valid());
}

#[tokio::test]
async fn test_violation_lines_from_engine() {
    let engine = engine(ValidationConfig::default()).await;

    let result = engine
        .validate_single_file(&common::fixture("xml/invalid.xml"))
        .await;

    let lines: Vec<String> = result.violations.iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "TX-2001: Empty value for tag - mandatoryTag2 -> subTag1 -> subSubTag1",
            "Unknown: Missing tag - transactionId",
            "Unknown: Missing tag - mandatoryTag2 -> subTag1 -> subSubTag2",
            "Unknown: Count mismatch for tag - lineItems -> item. Expected: 3, Found: 2",
        ]
    );
    assert_eq!(result.record_count, 2);
}

#[tokio::test]
async fn test_json_fixture_is_valid() {
    let engine = engine(ValidationConfig::default()).await;

    let result = engine
        .validate_single_file(&common::fixture("json/valid.json"))
        .await;

    assert!(result.status.is_valid());
    assert_eq!(result.record_count, 1);
}

#[tokio::test]
async fn test_mixed_directory_aggregation() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    for i in 0..3 {
        common::create_test_file(
            &root.join(format!("good{}.xml", i)),
            common::VALID_RECORD_XML,
        )
        .await
        .unwrap();
    }
    common::create_test_file(&root.join("nested/bad.xml"), common::MISSING_TAG3_XML)
        .await
        .unwrap();
    common::create_test_file(&root.join("notes.txt"), "not a document")
        .await
        .unwrap();

    let engine = engine(ValidationConfig {
        max_concurrent_validations: 2,
        ..ValidationConfig::default()
    })
    .await;

    let results = engine
        .validate_path(root, &FileDiscovery::new())
        .await
        .unwrap();

    assert_eq!(results.total_files, 4);
    assert_eq!(results.valid_files, 3);
    assert_eq!(results.invalid_files, 1);
    assert_eq!(results.total_violations, 1);
    assert_eq!(results.success_rate(), 75.0);

    let (path, violation) = results.violations().next().unwrap();
    assert!(path.ends_with("nested/bad.xml"));
    assert_eq!(violation.to_string(), "TX-9002: Missing tag - mandatoryTag3");
}

#[tokio::test]
async fn test_fail_fast_skips_remaining_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    common::create_test_file(&root.join("a_bad.xml"), common::MISSING_TAG3_XML)
        .await
        .unwrap();
    for name in ["b.xml", "c.xml", "d.xml"] {
        common::create_test_file(&root.join(name), common::VALID_RECORD_XML)
            .await
            .unwrap();
    }

    let engine = engine(ValidationConfig {
        max_concurrent_validations: 1,
        fail_fast: true,
        ..ValidationConfig::default()
    })
    .await;

    let results = engine
        .validate_path(root, &FileDiscovery::new())
        .await
        .unwrap();

    assert_eq!(results.total_files, 4);
    assert_eq!(results.invalid_files, 1);
    assert_eq!(results.skipped_files, 3);
    assert!(results.file_results[0].status.is_invalid());
}

#[tokio::test]
async fn test_progress_reports_every_phase() {
    let engine = engine(ValidationConfig::default()).await;
    let phases = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&phases);

    engine
        .validate_path_with_progress(
            &common::fixture("xml"),
            &FileDiscovery::new(),
            Some(Arc::new(move |update: ValidationProgress| {
                sink.lock().unwrap().push(update.phase)
            })),
        )
        .await
        .unwrap();

    let phases = phases.lock().unwrap();
    assert_eq!(phases.first(), Some(&ValidationPhase::Discovery));
    assert_eq!(phases.last(), Some(&ValidationPhase::Complete));
    assert_eq!(
        phases
            .iter()
            .filter(|phase| **phase == ValidationPhase::Validation)
            .count(),
        4
    );
}

#[tokio::test]
async fn test_metrics_are_collected() {
    let engine = engine(ValidationConfig {
        collect_metrics: true,
        validation_timeout: Duration::from_secs(10),
        ..ValidationConfig::default()
    })
    .await;

    let results = engine
        .validate_path(&common::fixture("xml"), &FileDiscovery::new())
        .await
        .unwrap();

    let metrics = &results.performance_metrics;
    assert_eq!(
        metrics.concurrent_validations,
        engine.config().max_concurrent_validations
    );
    assert!(metrics.total_duration >= metrics.validation_duration);
    assert!(metrics.throughput_files_per_second > 0.0);
}

#[tokio::test]
async fn test_missing_path_is_an_error() {
    let engine = engine(ValidationConfig::default()).await;

    let result = engine
        .validate_path(
            &common::fixture("does/not/exist"),
            &FileDiscovery::new(),
        )
        .await;

    assert!(result.is_err());
}
