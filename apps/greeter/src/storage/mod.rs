use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::errors::StorageError;

pub mod mock;

pub use mock::MockStorageClient;

/// Persists a blob and hands back a reference to it (a path for local disk).
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn save_file(&self, data: &[u8], filename: &str) -> Result<String, StorageError>;
}

/// Writes files under a base directory, created on construction.
pub struct LocalStorageClient {
    base_dir: PathBuf,
}

impl LocalStorageClient {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir).map_err(|source| StorageError::Write {
            path: base_dir.clone(),
            source,
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[async_trait]
impl StorageClient for LocalStorageClient {
    async fn save_file(&self, data: &[u8], filename: &str) -> Result<String, StorageError> {
        let dest = self.base_dir.join(filename);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&dest, data)
            .await
            .map_err(|source| StorageError::Write {
                path: dest.clone(),
                source,
            })?;

        info!("File saved to {}", dest.display());
        Ok(dest.display().to_string())
    }
}

/// `<YYYYmmdd_HHMMSS>_<hash8><extension>`, where `hash8` is the first eight
/// hex digits of the content's SHA-256. The timestamp part is optional.
pub fn image_file_name(data: &[u8], extension: &str, add_date: bool) -> String {
    let digest = Sha256::digest(data);
    let hash: String = digest
        .iter()
        .take(4)
        .map(|b| format!("{b:02x}"))
        .collect();

    let mut parts = Vec::with_capacity(2);
    if add_date {
        parts.push(Local::now().format("%Y%m%d_%H%M%S").to_string());
    }
    parts.push(hash);
    format!("{}{extension}", parts.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_storage_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let client = LocalStorageClient::new(dir.path().join("images")).unwrap();
        assert!(client.base_dir().is_dir());

        let reference = client.save_file(b"png bytes", "a.png").await.unwrap();
        assert_eq!(std::fs::read(&reference).unwrap(), b"png bytes");
        assert!(reference.ends_with("a.png"));
    }

    #[tokio::test]
    async fn test_local_storage_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let client = LocalStorageClient::new(dir.path()).unwrap();
        let reference = client.save_file(b"x", "2024/06/a.png").await.unwrap();
        assert!(std::path::Path::new(&reference).is_file());
    }

    #[test]
    fn test_file_name_without_date_is_content_hash() {
        // sha256("hello") = 2cf24dba5fb0a30e...
        assert_eq!(image_file_name(b"hello", ".png", false), "2cf24dba.png");
    }

    #[test]
    fn test_file_name_with_date_prefix() {
        let name = image_file_name(b"hello", ".png", true);
        let (stamp, rest) = name.split_at(15);
        assert_eq!(rest, "_2cf24dba.png");
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "_");
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }
}
