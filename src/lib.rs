//! # validate-records Library
//!
//! Checks that every record in an XML or JSON document carries the mandatory
//! fields declared by a nested schema, that required leaves are not blank, and
//! that declared `count` attributes match the number of repeated elements.
//!
//! The core ([`matcher`], [`reconcile`], [`driver`]) works on an in-memory
//! [`tree::DataNode`] tree; [`validator::ValidationEngine`] runs it concurrently
//! over many files.

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod error_reporter;
pub mod file_discovery;
pub mod matcher;
pub mod output;
pub mod parser;
pub mod reconcile;
pub mod schema;
pub mod schema_loader;
pub mod tree;
pub mod validator;
pub mod violation;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager};
pub use driver::{
    DocumentReport, RecordOptions, record_identifier, validate_document, validate_record,
};
pub use error::{ParseError, SchemaError, ValidationError};
pub use error_reporter::ErrorReporter;
pub use file_discovery::{DiscoveryStats, FileDiscovery};
pub use matcher::match_schema;
pub use output::Output;
pub use parser::{DocumentFormat, parse_document, parse_json, parse_xml};
pub use reconcile::reconcile_counts;
pub use schema::{Schema, SchemaFields, SchemaNode};
pub use schema_loader::SchemaLoader;
pub use tree::{DataNode, Document, Fields, NodeValue};
pub use validator::{
    FileValidationResult, PerformanceMetrics, ProgressCallback, ValidationConfig, ValidationEngine,
    ValidationPhase, ValidationProgress, ValidationResults, ValidationStatus,
};
pub use violation::{FieldPath, RecordViolation, Violation, ViolationKind};
