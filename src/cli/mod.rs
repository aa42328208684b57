//! CLI command handlers
//!
//! This module contains the flag parsing and the handlers that bridge the
//! selected action with the backup and restore managers.

pub mod args;
pub mod backup;
pub mod debug;

pub use args::{usage, Action, Cli};
pub use backup::{handle_backup_action, handle_list};
pub use debug::games_report;
