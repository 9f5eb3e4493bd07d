use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::StorageClient;
use crate::errors::StorageError;

/// Keeps saved files in memory and answers with `mock://<filename>`, or a
/// fixed reference when one is configured.
#[derive(Default)]
pub struct MockStorageClient {
    reference: Option<String>,
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MockStorageClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            files: Mutex::default(),
        }
    }

    pub fn files(&self) -> BTreeMap<String, Vec<u8>> {
        self.files.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StorageClient for MockStorageClient {
    async fn save_file(&self, data: &[u8], filename: &str) -> Result<String, StorageError> {
        if let Ok(mut files) = self.files.lock() {
            files.insert(filename.to_string(), data.to_vec());
        }
        Ok(self
            .reference
            .clone()
            .unwrap_or_else(|| format!("mock://{filename}")))
    }
}
