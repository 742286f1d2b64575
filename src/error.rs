use std::path::PathBuf;

use thiserror::Error;

/// Main application error type that encompasses all operational failure modes.
///
/// Field-level findings (missing tags, empty values, count mismatches) are never
/// errors; they are reported as [`crate::violation::Violation`] values.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document parsing error: {0}")]
    Parse(#[from] ParseError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("No records found: document contains no <{record_tag}> elements")]
    NoRecords { record_tag: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation timeout: {file} after {timeout_seconds} seconds")]
    Timeout { file: PathBuf, timeout_seconds: u64 },

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

/// Errors raised while turning a source document into a data tree
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed XML at byte {position}: {details}")]
    Xml { position: u64, details: String },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document has no root element")]
    NoRootElement,

    #[error("unexpected closing tag </{name}>")]
    UnexpectedEndTag { name: String },

    #[error("second root element <{name}>")]
    MultipleRoots { name: String },

    #[error("element <{name}> is never closed")]
    UnclosedElement { name: String },

    #[error("JSON document root must be an object with a single root field")]
    InvalidJsonRoot,

    #[error("elements nested deeper than {depth} levels")]
    TooDeep { depth: usize },
}

/// Errors raised while building or loading a mandatory-field schema
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("duplicate schema key '{key}'")]
    DuplicateKey { key: String },

    #[error("schema root must be a table of fields")]
    RootNotInterior,

    #[error("TOML schema parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON schema parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema file format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Parse result type alias
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Schema result type alias
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let io_error = ValidationError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        ));
        assert!(io_error.to_string().contains("IO error"));

        let no_records = ValidationError::NoRecords {
            record_tag: "transaction".to_string(),
        };
        assert!(no_records.to_string().contains("No records found"));
        assert!(no_records.to_string().contains("<transaction>"));

        let timeout = ValidationError::Timeout {
            file: PathBuf::from("data/sample.xml"),
            timeout_seconds: 30,
        };
        assert_eq!(
            timeout.to_string(),
            "Validation timeout: data/sample.xml after 30 seconds"
        );
    }

    #[test]
    fn test_parse_error_display() {
        let xml = ParseError::Xml {
            position: 42,
            details: "mismatched tag".to_string(),
        };
        assert!(xml.to_string().contains("byte 42"));
        assert!(xml.to_string().contains("mismatched tag"));

        let end = ParseError::UnexpectedEndTag {
            name: "amount".to_string(),
        };
        assert_eq!(end.to_string(), "unexpected closing tag </amount>");
    }

    #[test]
    fn test_schema_error_display() {
        let dup = SchemaError::DuplicateKey {
            key: "amount".to_string(),
        };
        assert!(dup.to_string().contains("'amount'"));

        let format = SchemaError::UnsupportedFormat("yaml".to_string());
        assert!(format.to_string().contains("yaml"));
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: ValidationError = ParseError::NoRootElement.into();
        match err {
            ValidationError::Parse(ParseError::NoRootElement) => (),
            _ => panic!("Expected ValidationError::Parse"),
        }
    }

    #[test]
    fn test_schema_error_conversion() {
        let err: ValidationError = SchemaError::RootNotInterior.into();
        match err {
            ValidationError::Schema(SchemaError::RootNotInterior) => (),
            _ => panic!("Expected ValidationError::Schema"),
        }
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let validation_error = ValidationError::Io(io_error);

        assert!(validation_error.source().is_some());
        let source = validation_error.source().unwrap();
        assert_eq!(source.to_string(), "File not found");
    }

    #[test]
    fn test_wrapped_errors_keep_their_source() {
        use std::error::Error;

        let parse: ValidationError = ParseError::TooDeep { depth: 1024 }.into();
        assert_eq!(
            parse.source().map(ToString::to_string),
            Some("elements nested deeper than 1024 levels".to_string())
        );

        let schema: ValidationError = SchemaError::RootNotInterior.into();
        assert_eq!(
            schema.source().map(ToString::to_string),
            Some("schema root must be a table of fields".to_string())
        );
    }
}
