//! Backup system for GameVault
//!
//! Produces daily snapshots of the catalog database and the image bucket,
//! stores them in a backup bucket and restores them on demand.
//!
//! # Architecture
//!
//! - `BackupManager`: creates and uploads artifacts, prunes old local copies
//! - `RestoreManager`: selects artifacts and restores them
//! - `BackupCatalog`: lists, uploads and downloads artifacts in the backup bucket
//!
//! # Artifact Format
//!
//! Every artifact is a zip file named `<kind>_<YYYY-MM-DD>.zip`:
//! - `mongodb_*`: a native dump tree, or `backup.json` from the in-process dump
//! - `r2_*`: every object of the image bucket, keyed by its object key
//!
//! Remote copies live under `backups/` in the backup bucket.
//!
//! # Retention
//!
//! Local artifacts older than the retention window (7 days by default) are
//! deleted at the end of each backup run. Remote artifacts are never pruned.
//!
//! # Example
//!
//! ```rust,ignore
//! use gamevault::backup::{BackupManager, RestoreManager};
//!
//! let manager = BackupManager::new(&settings, store.clone(), snapshotter.clone());
//! let report = manager.create_full_backup().await?;
//!
//! let restore = RestoreManager::new(&settings, store, snapshotter);
//! let restored = restore.restore_from_date("2025-05-31").await?;
//! ```

mod artifact;
mod catalog;
mod manager;
mod restore;
mod retention;

pub use artifact::{
    artifact_key, artifact_name, ArtifactKind, BackupArtifact, ARTIFACT_EXTENSION,
    BACKUP_PREFIX, DATE_FORMAT,
};
pub use catalog::{BackupCatalog, ARTIFACT_CONTENT_TYPE};
pub use manager::{BackupManager, BackupReport, LocalArtifact, StoreArchive};
pub use restore::{ArtifactRestore, CompleteRestore, RestoreDetail, RestoreManager};
pub use retention::cleanup_local;
