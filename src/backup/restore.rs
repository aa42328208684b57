//! Backup restoration for GameVault
//!
//! Artifacts are selected from the backup bucket before anything is
//! downloaded, so a missing artifact never leaves a half-restored system.
//! When both kinds are restored the database always goes first.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::artifact::{ArtifactKind, BackupArtifact, BACKUP_PREFIX, DATE_FORMAT};
use super::catalog::BackupCatalog;
use crate::archive::{entry_name, extract};
use crate::config::{BackupPaths, Settings};
use crate::database::{DatabaseSnapshotter, RestoreOutcome};
use crate::error::{BackupError, BackupResult};
use crate::storage::{content_type_for, purge_bucket, ObjectStore};

/// Uploads between progress messages
const UPLOAD_PROGRESS_INTERVAL: usize = 10;

/// What restoring one artifact did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreDetail {
    Database(RestoreOutcome),
    ObjectStore {
        /// Objects removed from the bucket first
        purged: usize,
        uploaded: usize,
    },
}

/// Result of restoring one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRestore {
    pub artifact: String,
    pub kind: ArtifactKind,
    pub detail: RestoreDetail,
}

impl ArtifactRestore {
    /// One-line description of what was restored
    pub fn summary(&self) -> String {
        match &self.detail {
            RestoreDetail::Database(RestoreOutcome::Native) => {
                format!("{}: database restored with mongorestore", self.artifact)
            }
            RestoreDetail::Database(RestoreOutcome::Direct(collections)) => {
                let documents: u64 = collections.iter().map(|c| c.restored).sum();
                format!(
                    "{}: {} documents restored into {} collections",
                    self.artifact,
                    documents,
                    collections.len()
                )
            }
            RestoreDetail::ObjectStore { purged, uploaded } => format!(
                "{}: {} objects uploaded ({} removed first)",
                self.artifact, uploaded, purged
            ),
        }
    }
}

/// Result of restoring a database artifact and an object store artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteRestore {
    pub database: ArtifactRestore,
    pub store: ArtifactRestore,
}

/// Handles restoring from backups
pub struct RestoreManager {
    store: Arc<dyn ObjectStore>,
    snapshotter: Arc<DatabaseSnapshotter>,
    catalog: BackupCatalog,
    paths: BackupPaths,
    /// Bucket that object store artifacts are restored into
    target_bucket: String,
    /// Set when artifacts share the target bucket
    keep_prefix: Option<&'static str>,
}

impl RestoreManager {
    /// Create a new RestoreManager
    pub fn new(
        settings: &Settings,
        store: Arc<dyn ObjectStore>,
        snapshotter: Arc<DatabaseSnapshotter>,
    ) -> Self {
        Self {
            catalog: BackupCatalog::new(store.clone(), settings.backup_bucket.clone()),
            store,
            snapshotter,
            paths: BackupPaths::new(settings.backup_path.clone()),
            target_bucket: settings.bucket.clone(),
            keep_prefix: (settings.bucket == settings.backup_bucket).then_some(BACKUP_PREFIX),
        }
    }

    /// Restore one artifact, the newest one when no name is given
    ///
    /// The kind is inferred from the artifact name.
    pub async fn restore_from_backup(&self, name: Option<&str>) -> BackupResult<ArtifactRestore> {
        let artifacts = self.available().await?;
        let artifact = match name {
            Some(name) => find_named(&artifacts, name)?,
            None => artifacts.first().ok_or(BackupError::NoBackups)?,
        };

        info!("Restoring {} ({})", artifact.name, artifact.kind);
        self.restore_artifact(artifact).await
    }

    /// Restore a database artifact and an object store artifact
    ///
    /// Each defaults to the newest artifact of its kind.
    pub async fn restore_complete(
        &self,
        database: Option<&str>,
        store: Option<&str>,
    ) -> BackupResult<CompleteRestore> {
        let artifacts = self.available().await?;
        let database = select(&artifacts, ArtifactKind::Database, database)?;
        let store = select(&artifacts, ArtifactKind::ObjectStore, store)?;

        self.restore_pair(database, store).await
    }

    /// Restore both artifacts taken on `date` (`YYYY-MM-DD`)
    pub async fn restore_from_date(&self, date: &str) -> BackupResult<CompleteRestore> {
        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|_| BackupError::InvalidDate(date.to_string()))?;

        let artifacts = self.available().await?;
        let for_date = |kind: ArtifactKind| {
            artifacts
                .iter()
                .find(|a| a.kind == kind && a.matches_date(date))
                .ok_or_else(|| {
                    BackupError::backup_not_found(format!(
                        "{} backup for {}",
                        kind,
                        date.format(DATE_FORMAT)
                    ))
                })
        };
        let database = for_date(ArtifactKind::Database)?;
        let store = for_date(ArtifactKind::ObjectStore)?;

        self.restore_pair(database, store).await
    }

    async fn available(&self) -> BackupResult<Vec<BackupArtifact>> {
        let artifacts = self.catalog.list().await?;
        if artifacts.is_empty() {
            return Err(BackupError::NoBackups);
        }
        Ok(artifacts)
    }

    async fn restore_pair(
        &self,
        database: &BackupArtifact,
        store: &BackupArtifact,
    ) -> BackupResult<CompleteRestore> {
        info!("Restoring {} and {}", database.name, store.name);

        let database = self.restore_artifact(database).await?;
        let store = self.restore_artifact(store).await?;

        Ok(CompleteRestore { database, store })
    }

    /// Download an artifact, restore it and delete the local copy
    pub async fn restore_artifact(&self, artifact: &BackupArtifact) -> BackupResult<ArtifactRestore> {
        self.paths.ensure_directories()?;
        let local = self
            .catalog
            .download(artifact, self.paths.backup_dir())
            .await?;

        let result = match artifact.kind {
            ArtifactKind::Database => self
                .restore_database(&local)
                .await
                .map(RestoreDetail::Database),
            ArtifactKind::ObjectStore => self.restore_object_store(&local).await,
        };

        if let Err(e) = fs::remove_file(&local) {
            warn!("Could not remove {}: {}", local.display(), e);
        }

        Ok(ArtifactRestore {
            artifact: artifact.name.clone(),
            kind: artifact.kind,
            detail: result?,
        })
    }

    /// Restore a downloaded database artifact
    pub async fn restore_database(&self, archive: &Path) -> BackupResult<RestoreOutcome> {
        let dir = self.paths.extract_dir(archive);
        let result = async {
            extract(archive, &dir)?;
            self.snapshotter.restore_dir(&dir).await
        }
        .await;

        remove_extracted(&dir);
        result
    }

    /// Replace the target bucket's contents with a downloaded artifact
    pub async fn restore_object_store(&self, archive: &Path) -> BackupResult<RestoreDetail> {
        let dir = self.paths.extract_dir(archive);
        let result = async {
            extract(archive, &dir)?;

            let purged =
                purge_bucket(self.store.as_ref(), &self.target_bucket, self.keep_prefix).await?;
            info!("Purged {} objects from {}", purged, self.target_bucket);

            let uploaded = self.upload_tree(&dir).await?;
            Ok::<_, BackupError>(RestoreDetail::ObjectStore { purged, uploaded })
        }
        .await;

        remove_extracted(&dir);
        result
    }

    async fn upload_tree(&self, root: &Path) -> BackupResult<usize> {
        let files: Vec<PathBuf> = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();

        let total = files.len();
        let mut uploaded = 0;

        for path in files {
            let relative = path.strip_prefix(root).map_err(|e| {
                BackupError::Io(format!("Unexpected path {}: {}", path.display(), e))
            })?;
            let key = entry_name(relative);

            self.store
                .put_file(&self.target_bucket, &key, &path, content_type_for(&path))
                .await?;

            uploaded += 1;
            if uploaded % UPLOAD_PROGRESS_INTERVAL == 0 {
                info!("Uploaded {}/{} objects", uploaded, total);
            }
        }

        info!("Uploaded {} objects to {}", uploaded, self.target_bucket);
        Ok(uploaded)
    }
}

fn find_named<'a>(artifacts: &'a [BackupArtifact], name: &str) -> BackupResult<&'a BackupArtifact> {
    artifacts
        .iter()
        .find(|a| a.name == name)
        .ok_or_else(|| BackupError::backup_not_found(name))
}

/// Named artifact (which must be of `kind`), or the newest of `kind`
fn select<'a>(
    artifacts: &'a [BackupArtifact],
    kind: ArtifactKind,
    name: Option<&str>,
) -> BackupResult<&'a BackupArtifact> {
    match name {
        Some(name) => {
            let artifact = find_named(artifacts, name)?;
            if artifact.kind != kind {
                return Err(BackupError::Validation(format!(
                    "{} is not a {} backup",
                    name, kind
                )));
            }
            Ok(artifact)
        }
        None => artifacts
            .iter()
            .find(|a| a.kind == kind)
            .ok_or_else(|| BackupError::backup_not_found(format!("latest {} backup", kind))),
    }
}

fn remove_extracted(dir: &Path) {
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            warn!("Could not remove {}: {}", dir.display(), e);
        }
    }
}
