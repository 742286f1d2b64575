//! Validation findings and their rendering.

use std::fmt;

use serde::Serialize;

/// Separator used when rendering a field path
pub const PATH_SEPARATOR: &str = " -> ";

/// Ordered field names from the record root to the offending field
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// A new path with `name` appended
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(PATH_SEPARATOR))
    }
}

/// Kind of discrepancy between the schema/count annotations and the data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required field or branch is absent
    MissingField,
    /// Required leaf is present but blank
    EmptyValue,
    /// Declared `count` does not match the number of occurrences
    CountMismatch { expected: u64, actual: usize },
}

/// A single finding at a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Violation {
    pub path: FieldPath,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl Violation {
    pub fn missing(path: FieldPath) -> Self {
        Self {
            path,
            kind: ViolationKind::MissingField,
        }
    }

    pub fn empty(path: FieldPath) -> Self {
        Self {
            path,
            kind: ViolationKind::EmptyValue,
        }
    }

    pub fn count_mismatch(path: FieldPath, expected: u64, actual: usize) -> Self {
        Self {
            path,
            kind: ViolationKind::CountMismatch { expected, actual },
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::MissingField => write!(f, "Missing tag - {}", self.path),
            ViolationKind::EmptyValue => write!(f, "Empty value for tag - {}", self.path),
            ViolationKind::CountMismatch { expected, actual } => write!(
                f,
                "Count mismatch for tag - {}. Expected: {}, Found: {}",
                self.path, expected, actual
            ),
        }
    }
}

/// A violation attributed to the record it was found in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordViolation {
    /// Diagnostic identifier of the record (not necessarily unique)
    pub record_id: String,
    /// Zero-based position of the record in its document
    pub record_index: usize,
    #[serde(flatten)]
    pub violation: Violation,
}

impl fmt::Display for RecordViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.record_id, self.violation)
    }
}
