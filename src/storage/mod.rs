//! Object storage layer
//!
//! [`ObjectStore`] is the seam between the backup workflow and an
//! S3-compatible provider. Every call is a single attempt; failures surface as
//! [`BackupError::Storage`] and are fatal for the step that issued them.
//!
//! [`BackupError::Storage`]: crate::error::BackupError::Storage

pub mod content_type;
#[cfg(test)]
pub(crate) mod memory;
pub mod s3;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{BackupError, BackupResult};

pub use content_type::content_type_for;
pub use s3::S3Store;

/// Largest number of keys accepted by a single batch delete
pub const MAX_DELETE_BATCH: usize = 1000;

/// Metadata for a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectInfo>,
    /// Token for the next page, `None` on the last page
    pub next_token: Option<String>,
}

/// Bucket-scoped operations against an S3-compatible store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of objects, optionally restricted to a key prefix
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<String>,
    ) -> BackupResult<ObjectPage>;

    /// Fetch an object's full contents
    async fn get_object(&self, bucket: &str, key: &str) -> BackupResult<Vec<u8>>;

    /// Store an object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> BackupResult<()>;

    /// Store a local file as an object
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> BackupResult<()> {
        let body = tokio::fs::read(path).await?;
        self.put_object(bucket, key, body, content_type).await
    }

    /// Delete up to [`MAX_DELETE_BATCH`] objects in one request
    ///
    /// Returns the number of keys the provider reported as deleted.
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> BackupResult<usize>;

    /// Existence probe; `Ok(false)` means the bucket is missing
    async fn head_bucket(&self, bucket: &str) -> BackupResult<bool>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> BackupResult<()>;
}

/// List every object under `prefix`, following continuation tokens
pub async fn list_all(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: Option<&str>,
) -> BackupResult<Vec<ObjectInfo>> {
    let mut objects = Vec::new();
    let mut token = None;

    loop {
        let page = store.list_page(bucket, prefix, token).await?;
        objects.extend(page.objects);
        token = page.next_token;
        if token.is_none() {
            break;
        }
    }

    Ok(objects)
}

/// Delete `keys` in chunks no larger than [`MAX_DELETE_BATCH`]
pub async fn delete_in_batches(
    store: &dyn ObjectStore,
    bucket: &str,
    keys: &[String],
) -> BackupResult<usize> {
    let mut deleted = 0;
    for chunk in keys.chunks(MAX_DELETE_BATCH) {
        deleted += store.delete_objects(bucket, chunk).await?;
        debug!("Deleted batch of {} objects from {}", chunk.len(), bucket);
    }
    Ok(deleted)
}

/// Remove every object from a bucket, page by page
///
/// Keys starting with `keep_prefix` are left in place.
pub async fn purge_bucket(
    store: &dyn ObjectStore,
    bucket: &str,
    keep_prefix: Option<&str>,
) -> BackupResult<usize> {
    let mut deleted = 0;
    let mut token = None;

    loop {
        let page = store.list_page(bucket, None, token).await?;
        let keys: Vec<String> = page
            .objects
            .into_iter()
            .map(|o| o.key)
            .filter(|key| keep_prefix.map_or(true, |p| !key.starts_with(p)))
            .collect();
        if !keys.is_empty() {
            let removed = delete_in_batches(store, bucket, &keys).await?;
            info!("Deleted {} objects from {}", removed, bucket);
            deleted += removed;
        }

        token = page.next_token;
        if token.is_none() {
            break;
        }
    }

    Ok(deleted)
}

/// Make sure a bucket exists, creating it if the probe says it is missing
pub async fn ensure_bucket(store: &dyn ObjectStore, bucket: &str) -> BackupResult<()> {
    let exists = store
        .head_bucket(bucket)
        .await
        .map_err(|e| BackupError::Bucket(format!("failed to verify {}: {}", bucket, e)))?;
    if exists {
        info!("Bucket verified: {}", bucket);
        return Ok(());
    }

    store
        .create_bucket(bucket)
        .await
        .map_err(|e| BackupError::Bucket(format!("failed to create {}: {}", bucket, e)))?;
    info!("Bucket created: {}", bucket);
    Ok(())
}
