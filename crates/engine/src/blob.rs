//! Blob store contract and the two backends.
//!
//! `put` writes bytes under `bucket/path` and returns the public URL the
//! browser and the worker fetch from. Paths are relative, `/`-separated and
//! may not climb out of the bucket.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError>;
}

fn check_key(bucket: &str, path: &str) -> Result<(), StorageError> {
    let bad_segment = |s: &str| s.is_empty() || s == "." || s == ".." || s.contains('\\');
    if bad_segment(bucket) || bucket.contains('/') {
        return Err(StorageError::Rejected(format!("invalid bucket '{bucket}'")));
    }
    if path.starts_with('/') || path.split('/').any(bad_segment) {
        return Err(StorageError::Rejected(format!("invalid blob path '{path}'")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Local filesystem
// ---------------------------------------------------------------------------

/// Writes blobs to `{root}/{bucket}/{path}`; URLs are
/// `{public_base_url}/{bucket}/{path}`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        check_key(bucket, path)?;

        let dest = self.root.join(bucket).join(path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, bytes).await?;

        tracing::debug!(bucket, path, content_type, size = bytes.len(), "Blob written");
        Ok(format!("{}/{bucket}/{path}", self.public_base_url))
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// A stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Keeps blobs in memory; URLs use the `mem://` scheme.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, bucket: &str, path: &str) -> Option<StoredBlob> {
        self.blobs.read().await.get(&format!("{bucket}/{path}")).cloned()
    }

    pub async fn count(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        check_key(bucket, path)?;
        let key = format!("{bucket}/{path}");
        self.blobs.write().await.insert(
            key.clone(),
            StoredBlob {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("mem://{key}"))
    }
}
