//! Local artifact retention
//!
//! Artifacts stay on disk after upload and are pruned by age at the end of
//! each backup run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{info, warn};

use crate::config::RetentionPolicy;

/// Delete regular files in `dir` older than the retention window
///
/// Returns the deleted paths. Failures are logged and skipped.
pub fn cleanup_local(dir: &Path, policy: &RetentionPolicy, now: SystemTime) -> Vec<PathBuf> {
    let max_age = policy.max_age();
    let mut deleted = Vec::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Could not read {} for cleanup: {}", dir.display(), e);
            return deleted;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let modified = match entry.metadata() {
            Ok(metadata) if metadata.is_file() => metadata.modified(),
            Ok(_) => continue,
            Err(e) => {
                warn!("Could not stat {}: {}", path.display(), e);
                continue;
            }
        };

        let age = match modified.map(|mtime| now.duration_since(mtime)) {
            Ok(Ok(age)) => age,
            // Modified in the future relative to `now`
            Ok(Err(_)) => continue,
            Err(e) => {
                warn!("Could not read mtime of {}: {}", path.display(), e);
                continue;
            }
        };

        if age > max_age {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Deleted old local backup {}", path.display());
                    deleted.push(path);
                }
                Err(e) => warn!("Could not delete {}: {}", path.display(), e),
            }
        }
    }

    deleted
}
