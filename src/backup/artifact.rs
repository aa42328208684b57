//! Backup artifact naming and classification
//!
//! Artifacts are named `<kind>_<YYYY-MM-DD>.zip` and stored remotely under
//! [`BACKUP_PREFIX`]. The kind is inferred from the name alone.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::storage::ObjectInfo;

/// Key prefix for artifacts in the backup bucket
pub const BACKUP_PREFIX: &str = "backups/";

/// File extension of every artifact
pub const ARTIFACT_EXTENSION: &str = ".zip";

/// Date format embedded in artifact names
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// What an artifact contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Database dump (native tree or `backup.json`)
    Database,
    /// Object store contents
    ObjectStore,
}

impl ArtifactKind {
    /// Name prefix used for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Database => "mongodb",
            Self::ObjectStore => "r2",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Database => "MongoDB",
            Self::ObjectStore => "R2",
        }
    }

    /// Infer the kind from an artifact name
    pub fn classify(name: &str) -> Self {
        if name.contains(Self::Database.prefix()) {
            Self::Database
        } else {
            Self::ObjectStore
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Artifact file name for `kind` on `date`
pub fn artifact_name(kind: ArtifactKind, date: NaiveDate) -> String {
    format!(
        "{}_{}{}",
        kind.prefix(),
        date.format(DATE_FORMAT),
        ARTIFACT_EXTENSION
    )
}

/// A backup artifact stored in the backup bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    /// Full object key, including [`BACKUP_PREFIX`]
    pub key: String,
    /// File name part of the key
    pub name: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
    pub kind: ArtifactKind,
}

impl BackupArtifact {
    /// Build from a listed object; anything that is not a `.zip` is ignored
    pub fn from_object(object: ObjectInfo) -> Option<Self> {
        if !object.key.ends_with(ARTIFACT_EXTENSION) {
            return None;
        }

        let name = object
            .key
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())?
            .to_string();

        Some(Self {
            kind: ArtifactKind::classify(&name),
            name,
            key: object.key,
            size_bytes: object.size,
            last_modified: object.last_modified,
        })
    }

    /// Date embedded in the name, when it follows the naming scheme
    pub fn date(&self) -> Option<NaiveDate> {
        let stem = self.name.strip_suffix(ARTIFACT_EXTENSION)?;
        let (_, date) = stem.rsplit_once('_')?;
        NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
    }

    /// Whether the name mentions `date`
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        self.name.contains(&date.format(DATE_FORMAT).to_string())
    }
}

/// Remote key for an artifact file name
pub fn artifact_key(name: &str) -> String {
    format!("{}{}", BACKUP_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(key: &str) -> ObjectInfo {
        ObjectInfo {
            key: key.to_string(),
            size: 10,
            last_modified: Utc::now(),
        }
    }

    #[test]
    fn test_artifact_name() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        assert_eq!(artifact_name(ArtifactKind::Database, date), "mongodb_2025-05-31.zip");
        assert_eq!(artifact_name(ArtifactKind::ObjectStore, date), "r2_2025-05-31.zip");
    }

    #[test]
    fn test_classify() {
        assert_eq!(ArtifactKind::classify("mongodb_2025-05-31.zip"), ArtifactKind::Database);
        assert_eq!(ArtifactKind::classify("r2_2025-05-31.zip"), ArtifactKind::ObjectStore);
        assert_eq!(ArtifactKind::classify("manual-export.zip"), ArtifactKind::ObjectStore);
    }

    #[test]
    fn test_from_object() {
        let artifact = BackupArtifact::from_object(object("backups/mongodb_2025-05-31.zip")).unwrap();
        assert_eq!(artifact.name, "mongodb_2025-05-31.zip");
        assert_eq!(artifact.key, "backups/mongodb_2025-05-31.zip");
        assert_eq!(artifact.kind, ArtifactKind::Database);
        assert_eq!(artifact.date(), NaiveDate::from_ymd_opt(2025, 5, 31));
    }

    #[test]
    fn test_from_object_ignores_non_zip() {
        assert!(BackupArtifact::from_object(object("backups/notes.txt")).is_none());
        assert!(BackupArtifact::from_object(object("backups/")).is_none());
    }

    #[test]
    fn test_matches_date() {
        let artifact = BackupArtifact::from_object(object("backups/r2_2025-05-31.zip")).unwrap();
        assert!(artifact.matches_date(NaiveDate::from_ymd_opt(2025, 5, 31).unwrap()));
        assert!(!artifact.matches_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));
    }

    #[test]
    fn test_date_of_unconventional_name() {
        let artifact = BackupArtifact::from_object(object("backups/manual.zip")).unwrap();
        assert_eq!(artifact.date(), None);
    }

    #[test]
    fn test_artifact_key() {
        assert_eq!(artifact_key("r2_2025-05-31.zip"), "backups/r2_2025-05-31.zip");
    }
}
