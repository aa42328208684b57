//! GameVault backup - snapshot and restore for the GameVault catalog
//!
//! This library backs up the catalog's MongoDB database and its S3-compatible
//! image bucket (Cloudflare R2 in production) into dated zip artifacts, keeps
//! them in a backup bucket and restores them on demand.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Environment settings and local directory layout
//! - `error`: Custom error types
//! - `archive`: Zip compression and extraction
//! - `storage`: Object store abstraction and the S3 client
//! - `database`: Database abstraction, native tools and JSON snapshots
//! - `backup`: Backup creation, artifact catalog, restore and retention
//! - `models`: Game records inspected by the debug listing
//! - `display`: Terminal output formatting
//! - `cli`: Flag parsing and action handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use gamevault::config::Settings;
//!
//! let settings = Settings::from_env()?;
//! let manager = BackupManager::new(&settings, store, snapshotter);
//! manager.create_full_backup().await?;
//! ```

pub mod archive;
pub mod backup;
pub mod cli;
pub mod config;
pub mod database;
pub mod display;
pub mod error;
pub mod models;
pub mod storage;

pub use error::BackupError;
