#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use validate_records::{Schema, SchemaLoader};

/// Root of the checked-in fixtures
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn fixture(relative: &str) -> PathBuf {
    fixtures_dir().join(relative)
}

pub fn read_fixture(relative: &str) -> String {
    std::fs::read_to_string(fixture(relative)).unwrap()
}

pub async fn transaction_schema() -> Arc<Schema> {
    SchemaLoader::load(&fixture("schemas/transaction.toml"))
        .await
        .unwrap()
}

/// Write `content` to `path`, creating parent directories
pub async fn create_test_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await
}

pub const VALID_RECORD_XML: &str = r#"<?xml version="1.0"?>
<root>
  <transaction>
    <transactionId>TX-9001</transactionId>
    <mandatoryTag1>Payment</mandatoryTag1>
    <mandatoryTag2>
      <subTag1>
        <subSubTag1>EUR</subSubTag1>
        <subSubTag2><subSubSubTag1>NL91ABNA0417164300</subSubSubTag1></subSubTag2>
      </subTag1>
    </mandatoryTag2>
    <mandatoryTag3>2024-04-01</mandatoryTag3>
  </transaction>
</root>"#;

pub const MISSING_TAG3_XML: &str = r#"<?xml version="1.0"?>
<root>
  <transaction>
    <transactionId>TX-9002</transactionId>
    <mandatoryTag1>Payment</mandatoryTag1>
    <mandatoryTag2>
      <subTag1>
        <subSubTag1>EUR</subSubTag1>
        <subSubTag2><subSubSubTag1>NL91ABNA0417164300</subSubSubTag1></subSubTag2>
      </subTag1>
    </mandatoryTag2>
  </transaction>
</root>"#;
