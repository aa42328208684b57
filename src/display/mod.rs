//! Display formatting for terminal output
//!
//! Provides utilities for formatting backup listings, run summaries and the
//! debug game listing as plain text tables.

pub mod backup;
pub mod games;

pub use backup::{
    format_age, format_backup_list, format_backup_report, format_complete_restore,
    format_restore, format_size,
};
pub use games::format_game_list;
