//! Database dump and restore
//!
//! # Architecture
//!
//! - [`DocumentDatabase`]: the handful of driver calls the snapshot paths need
//! - [`MongoDatabase`]: implementation over the official MongoDB driver
//! - [`NativeTool`] / [`MongoTools`]: `mongodump` / `mongorestore` subprocesses
//! - [`DatabaseSnapshotter`]: picks the native or in-process path and runs it
//!
//! # Snapshot formats
//!
//! A database artifact contains either a native dump tree or a single
//! `backup.json` produced by the in-process fallback. Restore prefers
//! `backup.json` when present.

pub mod mongo;
pub mod native;
pub mod snapshot;
pub mod snapshotter;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::BackupResult;

pub use mongo::MongoDatabase;
pub use native::{MongoTools, NativeTool, Tool};
pub use snapshot::{DatabaseSnapshot, SnapshotValue, SNAPSHOT_FILE};
pub use snapshotter::{CollectionRestore, DatabaseSnapshotter, DumpOutcome, RestoreOutcome};

/// Collection used by the catalog for game records
pub const GAMES_COLLECTION: &str = "games";

/// Minimal document-database surface used by backups
#[async_trait]
pub trait DocumentDatabase: Send + Sync {
    /// Database name
    fn name(&self) -> &str;

    /// Names of all user collections
    async fn collection_names(&self) -> BackupResult<Vec<String>>;

    /// Every document of a collection
    async fn find_all(&self, collection: &str) -> BackupResult<Vec<Document>>;

    /// Delete every document of a collection, returning how many were removed
    async fn delete_all(&self, collection: &str) -> BackupResult<u64>;

    /// Insert documents without stopping at the first failure
    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> BackupResult<usize>;

    /// Number of documents in a collection
    async fn count(&self, collection: &str) -> BackupResult<u64>;

    /// Up to `limit` documents, in natural order
    async fn sample(&self, collection: &str, limit: i64) -> BackupResult<Vec<Document>>;
}
