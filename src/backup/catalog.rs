//! Remote artifact catalog in the backup bucket

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use super::artifact::{artifact_key, BackupArtifact, BACKUP_PREFIX};
use crate::error::{BackupError, BackupResult};
use crate::storage::{list_all, ObjectStore};

/// Content type used when uploading artifacts
pub const ARTIFACT_CONTENT_TYPE: &str = "application/zip";

/// Lists, uploads and downloads artifacts in one bucket
#[derive(Clone)]
pub struct BackupCatalog {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl BackupCatalog {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Bucket holding the artifacts
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// All artifacts, newest first
    pub async fn list(&self) -> BackupResult<Vec<BackupArtifact>> {
        let objects = list_all(self.store.as_ref(), &self.bucket, Some(BACKUP_PREFIX)).await?;

        let mut artifacts: Vec<BackupArtifact> = objects
            .into_iter()
            .filter_map(BackupArtifact::from_object)
            .collect();

        // Newest first; ties broken by name so the order is stable
        artifacts.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| b.name.cmp(&a.name))
        });

        debug!("Found {} artifacts in {}", artifacts.len(), self.bucket);
        Ok(artifacts)
    }

    /// Upload a local artifact under `backups/<file name>`
    pub async fn upload(&self, path: &Path) -> BackupResult<String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                BackupError::Validation(format!("Not an artifact file: {}", path.display()))
            })?;

        let key = artifact_key(&name);
        self.store
            .put_file(&self.bucket, &key, path, ARTIFACT_CONTENT_TYPE)
            .await?;

        info!("Uploaded {} to {}/{}", name, self.bucket, key);
        Ok(key)
    }

    /// Download an artifact into `dir`, returning the local path
    pub async fn download(&self, artifact: &BackupArtifact, dir: &Path) -> BackupResult<PathBuf> {
        let bytes = self.store.get_object(&self.bucket, &artifact.key).await?;
        let path = dir.join(&artifact.name);

        tokio::fs::write(&path, &bytes).await.map_err(|e| {
            BackupError::Io(format!("Failed to write {}: {}", path.display(), e))
        })?;

        info!("Downloaded {} ({} bytes)", artifact.name, bytes.len());
        Ok(path)
    }
}
