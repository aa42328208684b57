//! Native dump/restore utilities run as subprocesses
//!
//! Availability is probed up front (`<tool> --version`) so callers choose a
//! path explicitly instead of reacting to a failed spawn.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{BackupError, BackupResult};

/// Bound on the `--version` probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// The two native utilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Dump,
    Restore,
}

impl Tool {
    /// Default executable name
    pub fn program(&self) -> &'static str {
        match self {
            Tool::Dump => "mongodump",
            Tool::Restore => "mongorestore",
        }
    }
}

/// Vendor dump/restore utilities
#[async_trait]
pub trait NativeTool: Send + Sync {
    /// Whether the tool can be executed on this host
    async fn probe(&self, tool: Tool) -> bool;

    /// Dump the whole database into `out_dir`
    async fn dump(&self, out_dir: &Path) -> BackupResult<()>;

    /// Restore a native dump tree, dropping existing collections first
    async fn restore(&self, dump_dir: &Path) -> BackupResult<()>;
}

/// mongodump/mongorestore bound to one connection string
pub struct MongoTools {
    uri: String,
    timeout: Duration,
    dump_program: String,
    restore_program: String,
}

impl MongoTools {
    pub fn new(uri: impl Into<String>, timeout: Duration) -> Self {
        Self {
            uri: uri.into(),
            timeout,
            dump_program: Tool::Dump.program().to_string(),
            restore_program: Tool::Restore.program().to_string(),
        }
    }

    /// Use explicit executables instead of the ones on `PATH`
    pub fn with_programs(mut self, dump: impl Into<String>, restore: impl Into<String>) -> Self {
        self.dump_program = dump.into();
        self.restore_program = restore.into();
        self
    }

    fn program(&self, tool: Tool) -> &str {
        match tool {
            Tool::Dump => &self.dump_program,
            Tool::Restore => &self.restore_program,
        }
    }

    /// Arguments for a dump into `out_dir`
    pub fn dump_args(&self, out_dir: &Path) -> Vec<String> {
        vec![
            format!("--uri={}", self.uri),
            format!("--out={}", out_dir.display()),
        ]
    }

    /// Arguments for a restore from `dump_dir`
    pub fn restore_args(&self, dump_dir: &Path) -> Vec<String> {
        vec![
            format!("--uri={}", self.uri),
            "--drop".to_string(),
            format!("--dir={}", dump_dir.display()),
            "--preserveUUID".to_string(),
        ]
    }

    async fn run(&self, tool: Tool, args: Vec<String>) -> BackupResult<()> {
        let program = self.program(tool);
        let mut command = Command::new(program);
        command
            .args(&args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let status = tokio::time::timeout(self.timeout, command.status())
            .await
            .map_err(|_| {
                BackupError::Tool(format!(
                    "{} did not finish within {}s",
                    program,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| BackupError::Tool(format!("failed to execute {}: {}", program, e)))?;

        if !status.success() {
            return Err(BackupError::Tool(format!("{} exited with {}", program, status)));
        }

        Ok(())
    }
}

#[async_trait]
impl NativeTool for MongoTools {
    async fn probe(&self, tool: Tool) -> bool {
        let program = self.program(tool);
        let mut command = Command::new(program);
        command
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let available = matches!(
            tokio::time::timeout(PROBE_TIMEOUT, command.status()).await,
            Ok(Ok(status)) if status.success()
        );
        debug!("{} available: {}", program, available);
        available
    }

    async fn dump(&self, out_dir: &Path) -> BackupResult<()> {
        info!("Running mongodump into {}", out_dir.display());
        self.run(Tool::Dump, self.dump_args(out_dir)).await
    }

    async fn restore(&self, dump_dir: &Path) -> BackupResult<()> {
        info!("Running mongorestore from {}", dump_dir.display());
        self.run(Tool::Restore, self.restore_args(dump_dir)).await
    }
}

/// Write an executable stand-in that answers `--version` and then stalls
///
/// A dump leaves `partial.bson` in its `--out` directory before stalling.
#[cfg(all(test, unix))]
pub(crate) fn stalled_tool(dir: &Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("stalled-tool");
    let script = r#"#!/bin/sh
if [ "$1" = "--version" ]; then exit 0; fi
for arg in "$@"; do
  case "$arg" in --out=*) touch "${arg#--out=}/partial.bson" ;; esac
done
exec sleep 5
"#;
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
