//! Runtime settings for GameVault backups
//!
//! Settings are read from the environment exactly once at startup and then
//! passed by reference into every component.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BackupError, BackupResult};

/// Environment variables that must be present
pub const REQUIRED_VARS: [&str; 5] = [
    "MONGODB_URI",
    "R2_ENDPOINT",
    "R2_ACCESS_KEY_ID",
    "R2_SECRET_ACCESS_KEY",
    "R2_BUCKET",
];

/// Local backup retention settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Local artifacts older than this many days are deleted
    pub days_to_keep: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { days_to_keep: 7 }
    }
}

impl RetentionPolicy {
    /// Retention window as a duration
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(u64::from(self.days_to_keep) * 24 * 60 * 60)
    }
}

/// Connection settings for the S3-compatible object store
#[derive(Clone)]
pub struct StorageSettings {
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    /// Address buckets as `endpoint/bucket` instead of `bucket.endpoint`
    pub force_path_style: bool,
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Immutable settings for one backup or restore run
#[derive(Debug, Clone)]
pub struct Settings {
    /// MongoDB connection string
    pub mongodb_uri: String,

    /// Object store connection
    pub storage: StorageSettings,

    /// Bucket holding the catalog's images
    pub bucket: String,

    /// Bucket receiving backup artifacts (defaults to `bucket`)
    pub backup_bucket: String,

    /// Local directory for transient artifacts
    pub backup_path: PathBuf,

    /// Local retention policy
    pub retention: RetentionPolicy,

    /// Upper bound for mongodump/mongorestore runs
    pub native_tool_timeout: Duration,
}

fn default_backup_path() -> PathBuf {
    PathBuf::from("./backups")
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_native_tool_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> BackupResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    ///
    /// Every missing required variable is reported in a single error so a
    /// misconfigured deployment can be fixed in one pass.
    pub fn from_lookup<F>(lookup: F) -> BackupResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(BackupError::Config(format!(
                "missing environment variables: {}",
                missing.join(", ")
            )));
        }

        let required = |key: &str| get(key).unwrap_or_default();
        let bucket = required("R2_BUCKET");

        let days_to_keep = match get("BACKUP_RETENTION_DAYS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                BackupError::Config(format!("BACKUP_RETENTION_DAYS is not a number: {}", raw))
            })?,
            None => RetentionPolicy::default().days_to_keep,
        };

        let native_tool_timeout = match get("NATIVE_TOOL_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                BackupError::Config(format!("NATIVE_TOOL_TIMEOUT_SECS is not a number: {}", raw))
            })?),
            None => default_native_tool_timeout(),
        };

        let force_path_style = match get("R2_FORCE_PATH_STYLE") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                BackupError::Config(format!("R2_FORCE_PATH_STYLE is not a boolean: {}", raw))
            })?,
            None => false,
        };

        Ok(Self {
            mongodb_uri: required("MONGODB_URI"),
            storage: StorageSettings {
                endpoint: required("R2_ENDPOINT"),
                access_key_id: required("R2_ACCESS_KEY_ID"),
                secret_access_key: required("R2_SECRET_ACCESS_KEY"),
                region: get("R2_REGION").unwrap_or_else(default_region),
                force_path_style,
            },
            backup_bucket: get("BACKUP_R2_BUCKET").unwrap_or_else(|| bucket.clone()),
            bucket,
            backup_path: get("BACKUP_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_backup_path),
            retention: RetentionPolicy { days_to_keep },
            native_tool_timeout,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn test_settings(backup_path: PathBuf) -> Settings {
    Settings {
        mongodb_uri: "mongodb://localhost:27017/gamevault".into(),
        storage: StorageSettings {
            endpoint: "http://localhost:9000".into(),
            access_key_id: "test".into(),
            secret_access_key: "secret".into(),
            region: default_region(),
            force_path_style: true,
        },
        bucket: "games".into(),
        backup_bucket: "games-backup".into(),
        backup_path,
        retention: RetentionPolicy::default(),
        native_tool_timeout: default_native_tool_timeout(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("MONGODB_URI", "mongodb://db:27017/games"),
            ("R2_ENDPOINT", "https://account.r2.cloudflarestorage.com"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "secret"),
            ("R2_BUCKET", "games"),
        ]
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup_from(&complete_env())).unwrap();
        assert_eq!(settings.backup_bucket, "games");
        assert_eq!(settings.backup_path, PathBuf::from("./backups"));
        assert_eq!(settings.retention.days_to_keep, 7);
        assert_eq!(settings.storage.region, "auto");
        assert!(!settings.storage.force_path_style);
        assert_eq!(settings.native_tool_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let mut env = complete_env();
        env.push(("BACKUP_R2_BUCKET", "games-backup"));
        env.push(("BACKUP_PATH", "/var/backups/gamevault"));
        env.push(("BACKUP_RETENTION_DAYS", "14"));
        env.push(("R2_FORCE_PATH_STYLE", "true"));

        let settings = Settings::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(settings.bucket, "games");
        assert_eq!(settings.backup_bucket, "games-backup");
        assert_eq!(settings.backup_path, PathBuf::from("/var/backups/gamevault"));
        assert_eq!(settings.retention.days_to_keep, 14);
        assert!(settings.storage.force_path_style);
    }

    #[test]
    fn test_missing_variables_reported_together() {
        let err = Settings::from_lookup(lookup_from(&[("MONGODB_URI", "mongodb://x")])).unwrap_err();
        assert!(err.is_config());
        let message = err.to_string();
        assert!(message.contains("R2_ENDPOINT"));
        assert!(message.contains("R2_BUCKET"));
        assert!(!message.contains("MONGODB_URI"));
    }

    #[test]
    fn test_blank_variable_counts_as_missing() {
        let mut env = complete_env();
        env.retain(|(k, _)| *k != "R2_BUCKET");
        env.push(("R2_BUCKET", "   "));
        let err = Settings::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(err.to_string().contains("R2_BUCKET"));
    }

    #[test]
    fn test_invalid_retention() {
        let mut env = complete_env();
        env.push(("BACKUP_RETENTION_DAYS", "a week"));
        assert!(Settings::from_lookup(lookup_from(&env)).unwrap_err().is_config());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = Settings::from_lookup(lookup_from(&complete_env())).unwrap();
        let debug = format!("{:?}", settings);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("\"secret\""));
    }

    #[test]
    fn test_retention_max_age() {
        let policy = RetentionPolicy { days_to_keep: 2 };
        assert_eq!(policy.max_age(), Duration::from_secs(2 * 86_400));
    }
}
