use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::schema::Schema;

/// Loads mandatory-field schemas from TOML or JSON files
pub struct SchemaLoader;

impl SchemaLoader {
    /// Load a schema, choosing the format from the file extension
    pub async fn load(path: &Path) -> Result<Arc<Schema>> {
        let content = tokio::fs::read_to_string(path).await?;

        let schema = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Schema::from_toml_str(&content)?,
            Some("json") => Schema::from_json_str(&content)?,
            Some(ext) => return Err(SchemaError::UnsupportedFormat(ext.to_string()).into()),
            None => {
                // Try TOML first, then JSON
                match Schema::from_toml_str(&content) {
                    Ok(schema) => schema,
                    Err(_) => Schema::from_json_str(&content)?,
                }
            }
        };

        debug!(
            path = %path.display(),
            fields = schema.root().field_count(),
            depth = schema.root().depth(),
            "loaded schema"
        );
        Ok(Arc::new(schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_toml_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("schema.toml");
        tokio::fs::write(&path, "transactionId = true\n[payee]\nname = true\n")
            .await
            .unwrap();

        let schema = SchemaLoader::load(&path).await.unwrap();
        assert_eq!(schema.root().field_count(), 3);
    }

    #[tokio::test]
    async fn test_load_json_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("schema.json");
        tokio::fs::write(&path, r#"{"transactionId": true}"#)
            .await
            .unwrap();

        let schema = SchemaLoader::load(&path).await.unwrap();
        assert_eq!(schema.root().field_count(), 1);
    }

    #[tokio::test]
    async fn test_load_without_extension_falls_back_to_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("schema");
        tokio::fs::write(&path, r#"{"amount": true}"#).await.unwrap();

        let schema = SchemaLoader::load(&path).await.unwrap();
        assert!(schema.root().children().unwrap().get("amount").is_some());
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("schema.yaml");
        tokio::fs::write(&path, "amount: true").await.unwrap();

        let result = SchemaLoader::load(&path).await;
        assert!(matches!(
            result,
            Err(ValidationError::Schema(SchemaError::UnsupportedFormat(ext))) if ext == "yaml"
        ));
    }

    #[tokio::test]
    async fn test_missing_schema_file() {
        let result = SchemaLoader::load(Path::new("/nonexistent/schema.toml")).await;
        assert!(matches!(result, Err(ValidationError::Io(_))));
    }
}
