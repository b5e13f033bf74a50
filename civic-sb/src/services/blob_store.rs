//! Attachment storage
//!
//! The suggestion lifecycle only sees the `BlobStore` trait. `LocalBlobStore`
//! writes under `<root>/uploads`, which the router serves at `/uploads`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use civic_common::{Error, Result};
use tracing::debug;
use uuid::Uuid;

/// URL prefix under which stored blobs are served
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub url: String,
    pub size: u64,
}

/// Content-addressed-by-URL byte storage for media attachments
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes, returning a URL that can later be passed to `delete`
    async fn put(&self, bytes: &[u8], content_type: &str, file_name: &str) -> Result<StoredBlob>;

    /// Remove a stored blob; deleting an unknown URL is not an error
    async fn delete(&self, url: &str) -> Result<()>;
}

/// Reduce a client-supplied file name to a safe single path component
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(80)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn blob_key(file_name: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name))
}

/// Filesystem-backed store
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    dir: PathBuf,
}

impl LocalBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, url: &str) -> Result<PathBuf> {
        let key = url
            .strip_prefix(UPLOADS_URL_PREFIX)
            .filter(|key| !key.is_empty() && !key.contains(['/', '\\']) && *key != "..")
            .ok_or_else(|| Error::Storage(format!("Not a local upload URL: {}", url)))?;
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, bytes: &[u8], content_type: &str, file_name: &str) -> Result<StoredBlob> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create upload directory: {}", e)))?;

        let key = blob_key(file_name);
        let path = self.dir.join(&key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!("Stored {} bytes ({}) at {}", bytes.len(), content_type, path.display());

        Ok(StoredBlob {
            url: format!("{}{}", UPLOADS_URL_PREFIX, key),
            size: bytes.len() as u64,
        })
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let path = self.path_for(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// In-memory store with switchable failures, for tests
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_puts_after: Mutex<Option<usize>>,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `n` more uploads succeed, then fail every following one
    pub fn fail_puts_after(&self, n: usize) {
        if let Ok(mut guard) = self.fail_puts_after.lock() {
            *guard = Some(n);
        }
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.blobs
            .lock()
            .map(|blobs| blobs.contains_key(url))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Storage("Blob store lock poisoned".to_string())
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: &[u8], _content_type: &str, file_name: &str) -> Result<StoredBlob> {
        {
            let mut remaining = self.fail_puts_after.lock().map_err(poisoned)?;
            match remaining.as_mut() {
                Some(0) => return Err(Error::Storage("Simulated upload failure".to_string())),
                Some(n) => *n -= 1,
                None => {}
            }
        }

        let url = format!("{}{}", UPLOADS_URL_PREFIX, blob_key(file_name));
        self.blobs
            .lock()
            .map_err(poisoned)?
            .insert(url.clone(), bytes.to_vec());

        Ok(StoredBlob {
            url,
            size: bytes.len() as u64,
        })
    }

    async fn delete(&self, url: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::Storage("Simulated delete failure".to_string()));
        }
        self.blobs.lock().map_err(poisoned)?.remove(url);
        Ok(())
    }
}
