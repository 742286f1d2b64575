//! Record Driver
//!
//! Runs schema matching and count reconciliation over every record of a document
//! and tags each finding with the record's diagnostic identifier. Each record is
//! validated independently; the document report is the concatenation of the
//! per-record results in document order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::matcher::match_schema;
use crate::reconcile::reconcile_counts;
use crate::schema::Schema;
use crate::tree::{DataNode, Document};
use crate::violation::{FieldPath, RecordViolation};

/// How records are located and labeled inside a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordOptions {
    /// Element name of a record under the document root
    pub record_tag: String,
    /// Field holding the record's identifier
    pub id_field: String,
    /// Label used when the identifier is absent or blank
    pub unknown_label: String,
    /// Validate records on the rayon thread pool
    pub parallel: bool,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            record_tag: "transaction".to_string(),
            id_field: "transactionId".to_string(),
            unknown_label: "Unknown".to_string(),
            parallel: false,
        }
    }
}

/// Outcome of validating every record in one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub record_count: usize,
    pub violations: Vec<RecordViolation>,
}

impl DocumentReport {
    pub fn is_valid(&self) -> bool {
        self.record_count > 0 && self.violations.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }
}

/// Diagnostic label for a record: its trimmed identifier, or the fallback label
pub fn record_identifier<'a>(record: &'a DataNode, options: &'a RecordOptions) -> &'a str {
    record
        .first(&options.id_field)
        .and_then(DataNode::as_scalar)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(options.unknown_label.as_str())
}

/// Validate one record: schema findings first, then count findings
pub fn validate_record(
    record: &DataNode,
    index: usize,
    schema: &Schema,
    options: &RecordOptions,
) -> Vec<RecordViolation> {
    let root = FieldPath::root();
    let record_id = record_identifier(record, options);

    match_schema(record, schema.root(), &root)
        .into_iter()
        .chain(reconcile_counts(record, &root))
        .map(|violation| RecordViolation {
            record_id: record_id.to_string(),
            record_index: index,
            violation,
        })
        .collect()
}

/// Validate every record of `document`.
///
/// Fails with [`ValidationError::NoRecords`] when no `record_tag` element sits
/// under the root.
pub fn validate_document(
    document: &Document,
    schema: &Schema,
    options: &RecordOptions,
) -> Result<DocumentReport> {
    let records = document.records(&options.record_tag);
    if records.is_empty() {
        return Err(ValidationError::NoRecords {
            record_tag: options.record_tag.clone(),
        });
    }

    let per_record: Vec<Vec<RecordViolation>> = if options.parallel {
        records
            .par_iter()
            .enumerate()
            .map(|(index, record)| validate_record(record, index, schema, options))
            .collect()
    } else {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| validate_record(record, index, schema, options))
            .collect()
    };

    let violations: Vec<RecordViolation> = per_record.into_iter().flatten().collect();
    debug!(
        root = %document.root_name,
        records = records.len(),
        violations = violations.len(),
        "validated document"
    );

    Ok(DocumentReport {
        record_count: records.len(),
        violations,
    })
}
