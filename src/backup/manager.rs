//! Backup manager for GameVault
//!
//! Produces the two daily artifacts (database and object store), uploads
//! them to the backup bucket and prunes old local copies.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use super::artifact::{artifact_name, ArtifactKind, BackupArtifact, BACKUP_PREFIX};
use super::catalog::BackupCatalog;
use super::retention::cleanup_local;
use crate::archive::{compress_dir, ArchiveBuilder};
use crate::config::{BackupPaths, RetentionPolicy, Settings};
use crate::database::{DatabaseSnapshotter, DumpOutcome};
use crate::error::{BackupError, BackupResult};
use crate::storage::{ensure_bucket, ObjectStore};

/// Objects archived between progress messages
const ARCHIVE_PROGRESS_INTERVAL: usize = 25;

/// An artifact written to the local backup directory
#[derive(Debug, Clone)]
pub struct LocalArtifact {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl LocalArtifact {
    fn from_path(path: PathBuf) -> BackupResult<Self> {
        let size_bytes = fs::metadata(&path)
            .map_err(|e| BackupError::Io(format!("Failed to stat {}: {}", path.display(), e)))?
            .len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self {
            name,
            path,
            size_bytes,
        })
    }
}

/// Object store snapshot statistics
#[derive(Debug, Clone)]
pub struct StoreArchive {
    pub artifact: LocalArtifact,
    /// Objects written to the archive
    pub archived: usize,
    /// Objects whose download failed
    pub skipped: usize,
}

/// Summary of a full backup run
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub database: LocalArtifact,
    pub dump: DumpOutcome,
    pub store: StoreArchive,
    /// Local files removed by retention
    pub pruned: Vec<PathBuf>,
    pub duration: Duration,
}

/// Manages backup creation, upload and local retention
pub struct BackupManager {
    store: Arc<dyn ObjectStore>,
    snapshotter: Arc<DatabaseSnapshotter>,
    catalog: BackupCatalog,
    paths: BackupPaths,
    /// Bucket being backed up
    source_bucket: String,
    /// Set when artifacts share the source bucket
    skip_prefix: Option<&'static str>,
    retention: RetentionPolicy,
}

impl BackupManager {
    /// Create a new BackupManager
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
            source_bucket: settings.bucket.clone(),
            skip_prefix: (settings.bucket == settings.backup_bucket).then_some(BACKUP_PREFIX),
            retention: settings.retention.clone(),
        }
    }

    /// Run a complete backup
    ///
    /// Every step must succeed for the next one to run. Artifacts uploaded
    /// before a failure stay in the backup bucket.
    pub async fn create_full_backup(&self) -> BackupResult<BackupReport> {
        let started = Instant::now();
        info!("Starting full backup");

        self.paths.ensure_directories()?;
        ensure_bucket(self.store.as_ref(), &self.source_bucket).await?;
        ensure_bucket(self.store.as_ref(), self.catalog.bucket()).await?;

        let now = Utc::now();

        let (database, dump) = self.dump_database_archive(now).await?;
        self.upload_artifact(&database.path).await?;

        let store = self.create_store_archive(now).await?;
        self.upload_artifact(&store.artifact.path).await?;

        let pruned = self.cleanup_local(SystemTime::now());

        let duration = started.elapsed();
        info!("Full backup completed in {:.1}s", duration.as_secs_f64());

        Ok(BackupReport {
            database,
            dump,
            store,
            pruned,
            duration,
        })
    }

    /// Dump the database into a timestamped directory and compress it
    ///
    /// The scratch directory is removed whether or not the dump succeeds.
    pub async fn dump_database_archive(
        &self,
        now: DateTime<Utc>,
    ) -> BackupResult<(LocalArtifact, DumpOutcome)> {
        let timestamp = now
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let dump_dir = self.paths.dump_dir(&timestamp);
        let archive_path = self
            .paths
            .artifact_file(&artifact_name(ArtifactKind::Database, now.date_naive()));

        let result = self.dump_and_compress(&dump_dir, &archive_path).await;
        remove_scratch_dir(&dump_dir);

        let outcome = result?;
        let artifact = LocalArtifact::from_path(archive_path)?;
        info!(
            "Database archive {} ready ({} bytes)",
            artifact.name, artifact.size_bytes
        );
        Ok((artifact, outcome))
    }

    async fn dump_and_compress(
        &self,
        dump_dir: &Path,
        archive_path: &Path,
    ) -> BackupResult<DumpOutcome> {
        let outcome = self.snapshotter.dump(dump_dir).await?;
        let entries = compress_dir(dump_dir, archive_path)?;
        debug!("Compressed {} files into {}", entries, archive_path.display());
        Ok(outcome)
    }

    /// Archive every object of the source bucket
    ///
    /// Objects are fetched one at a time; a failed fetch is logged and the
    /// object is left out of the archive.
    pub async fn create_store_archive(&self, now: DateTime<Utc>) -> BackupResult<StoreArchive> {
        let path = self
            .paths
            .artifact_file(&artifact_name(ArtifactKind::ObjectStore, now.date_naive()));
        let mut builder = ArchiveBuilder::create(&path)?;
        let mut skipped = 0;
        let mut token = None;

        info!("Archiving objects from {}", self.source_bucket);

        loop {
            let page = self
                .store
                .list_page(&self.source_bucket, None, token)
                .await?;

            for object in page.objects {
                if object.key.ends_with('/') {
                    debug!("Skipping folder marker {}", object.key);
                    continue;
                }
                if self.skip_prefix.is_some_and(|p| object.key.starts_with(p)) {
                    debug!("Skipping backup artifact {}", object.key);
                    continue;
                }

                match self.store.get_object(&self.source_bucket, &object.key).await {
                    Ok(bytes) => {
                        builder.append(&object.key, &bytes)?;
                        if builder.len() % ARCHIVE_PROGRESS_INTERVAL == 0 {
                            info!("Archived {} objects", builder.len());
                        }
                    }
                    Err(e) => {
                        warn!("Skipping {}: {}", object.key, e);
                        skipped += 1;
                    }
                }
            }

            token = page.next_token;
            if token.is_none() {
                break;
            }
        }

        let archived = builder.finish()?;
        let artifact = LocalArtifact::from_path(path)?;
        info!(
            "Object store archive {} ready: {} objects, {} skipped",
            artifact.name, archived, skipped
        );

        Ok(StoreArchive {
            artifact,
            archived,
            skipped,
        })
    }

    /// Upload a local artifact to the backup bucket
    pub async fn upload_artifact(&self, path: &Path) -> BackupResult<String> {
        self.catalog.upload(path).await
    }

    /// Artifacts in the backup bucket, newest first
    pub async fn list_backups(&self) -> BackupResult<Vec<BackupArtifact>> {
        self.catalog.list().await
    }

    /// Delete local files older than the retention window
    pub fn cleanup_local(&self, now: SystemTime) -> Vec<PathBuf> {
        let deleted = cleanup_local(self.paths.backup_dir(), &self.retention, now);
        if !deleted.is_empty() {
            info!("Removed {} old local backups", deleted.len());
        }
        deleted
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        self.paths.backup_dir()
    }
}

fn remove_scratch_dir(dir: &Path) {
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            warn!("Could not remove {}: {}", dir.display(), e);
        }
    }
}
