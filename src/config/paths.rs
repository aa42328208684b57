//! Local path management for backup artifacts
//!
//! All transient files live under a single backup directory:
//!
//! - `<dir>/mongodb_<timestamp>/` while a database dump is in progress
//! - `<dir>/<kind>_<date>.zip` for finished or downloaded artifacts
//! - `<dir>/<kind>_<date>_extracted/` while an artifact is being restored

use std::path::{Path, PathBuf};

use crate::error::BackupError;

/// Manages the paths used by a backup run
#[derive(Debug, Clone)]
pub struct BackupPaths {
    /// Directory holding local artifacts
    backup_dir: PathBuf,
}

impl BackupPaths {
    /// Create BackupPaths rooted at the given directory
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    /// Get the backup directory
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Path of a local artifact file
    pub fn artifact_file(&self, name: &str) -> PathBuf {
        self.backup_dir.join(name)
    }

    /// Scratch directory for a database dump taken at `timestamp`
    pub fn dump_dir(&self, timestamp: &str) -> PathBuf {
        self.backup_dir.join(format!("mongodb_{}", timestamp))
    }

    /// Directory an artifact is extracted into (`x.zip` -> `x_extracted`)
    pub fn extract_dir(&self, artifact: &Path) -> PathBuf {
        let stem = artifact
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "artifact".to_string());
        let parent = artifact.parent().unwrap_or(&self.backup_dir);
        parent.join(format!("{}_extracted", stem))
    }

    /// Ensure the backup directory exists
    pub fn ensure_directories(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(&self.backup_dir).map_err(|e| {
            BackupError::Io(format!(
                "Failed to create backup directory {}: {}",
                self.backup_dir.display(),
                e
            ))
        })
    }
}
