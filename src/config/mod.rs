//! Configuration module for GameVault backups
//!
//! This module provides configuration management including:
//! - Environment-driven settings, validated once at startup
//! - Local backup directory layout
//! - Retention policy

pub mod paths;
pub mod settings;

pub use paths::BackupPaths;
pub use settings::{RetentionPolicy, Settings, StorageSettings};
