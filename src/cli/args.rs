//! Command-line flags
//!
//! Exactly one action flag may be given. Without any flag the usage screen is
//! printed.

use clap::{ArgGroup, Parser};

use crate::config::settings::REQUIRED_VARS;

/// GameVault backup and restore
#[derive(Parser, Debug)]
#[command(
    name = "gamevault-backup",
    version,
    about = "Backup and restore for the GameVault catalog database and image bucket",
    group(
        ArgGroup::new("action")
            .multiple(false)
            .args(["manual", "list", "restore", "restore_complete", "restore_date", "debug"])
    )
)]
pub struct Cli {
    /// Create a full backup now (database and object store)
    #[arg(long)]
    pub manual: bool,

    /// List backups stored in the backup bucket
    #[arg(long)]
    pub list: bool,

    /// Restore the newest backup, or the named one
    #[arg(long, value_name = "NAME", num_args = 0..=1)]
    pub restore: Option<Option<String>>,

    /// Restore database and object store, newest of each unless named
    #[arg(long, value_names = ["DB_BACKUP", "STORE_BACKUP"], num_args = 0..=2)]
    pub restore_complete: Option<Vec<String>>,

    /// Restore database and object store backups taken on a date
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub restore_date: Option<String>,

    /// List every game with its identifier and identifier type
    #[arg(long)]
    pub debug: bool,
}

/// The action selected on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Manual,
    List,
    Restore {
        name: Option<String>,
    },
    RestoreComplete {
        database: Option<String>,
        store: Option<String>,
    },
    RestoreDate {
        date: String,
    },
    Debug,
}

impl Cli {
    /// The requested action, `None` when no flag was given
    pub fn action(&self) -> Option<Action> {
        if self.manual {
            return Some(Action::Manual);
        }
        if self.list {
            return Some(Action::List);
        }
        if let Some(name) = &self.restore {
            return Some(Action::Restore { name: name.clone() });
        }
        if let Some(names) = &self.restore_complete {
            let mut names = names.iter().cloned();
            return Some(Action::RestoreComplete {
                database: names.next(),
                store: names.next(),
            });
        }
        if let Some(date) = &self.restore_date {
            return Some(Action::RestoreDate { date: date.clone() });
        }
        if self.debug {
            return Some(Action::Debug);
        }
        None
    }
}

/// Usage screen shown when no action is given
pub fn usage() -> String {
    let mut output = String::new();
    output.push_str("GameVault backup and restore\n");
    output.push_str("============================\n\n");
    output.push_str("Backup:\n");
    output.push_str("  gamevault-backup --manual                       Create a full backup\n\n");
    output.push_str("List:\n");
    output.push_str("  gamevault-backup --list                         List available backups\n\n");
    output.push_str("Restore:\n");
    output.push_str("  gamevault-backup --restore-complete [DB] [R2]   Restore everything (newest by default)\n");
    output.push_str("  gamevault-backup --restore-date YYYY-MM-DD      Restore everything from one date\n");
    output.push_str("  gamevault-backup --restore                      Restore the newest backup\n");
    output.push_str("  gamevault-backup --restore <file>               Restore a specific backup\n\n");
    output.push_str("Debug:\n");
    output.push_str("  gamevault-backup --debug                        List games and their identifiers\n\n");
    output.push_str("Examples:\n");
    output.push_str("  gamevault-backup --restore-date 2025-05-31\n");
    output.push_str("  gamevault-backup --restore mongodb_2025-05-31.zip\n");
    output.push_str("  gamevault-backup --restore r2_2025-05-31.zip\n\n");
    output.push_str("Required environment variables:\n");
    for var in REQUIRED_VARS {
        output.push_str(&format!("  {}\n", var));
    }
    output.push_str("Optional:\n");
    output.push_str("  BACKUP_R2_BUCKET, BACKUP_PATH, BACKUP_RETENTION_DAYS,\n");
    output.push_str("  R2_REGION, R2_FORCE_PATH_STYLE, NATIVE_TOOL_TIMEOUT_SECS\n");
    output
}
