//! MongoDB implementation of [`DocumentDatabase`]

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection, Database};
use tracing::{debug, warn};

use super::DocumentDatabase;
use crate::error::BackupResult;

/// Database used when the connection string does not name one
pub const FALLBACK_DATABASE: &str = "test";

/// Connection to the catalog database
#[derive(Debug, Clone)]
pub struct MongoDatabase {
    db: Database,
}

impl MongoDatabase {
    /// Connect using a MongoDB connection string
    ///
    /// The database is taken from the URI path, as the driver does.
    pub async fn connect(uri: &str) -> BackupResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client
            .default_database()
            .unwrap_or_else(|| client.database(FALLBACK_DATABASE));

        debug!("Connected to database {}", db.name());
        Ok(Self { db })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

#[async_trait]
impl DocumentDatabase for MongoDatabase {
    fn name(&self) -> &str {
        self.db.name()
    }

    async fn collection_names(&self) -> BackupResult<Vec<String>> {
        let mut names: Vec<String> = self
            .db
            .list_collection_names()
            .await?
            .into_iter()
            .filter(|name| !name.starts_with("system."))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn find_all(&self, collection: &str) -> BackupResult<Vec<Document>> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_all(&self, collection: &str) -> BackupResult<u64> {
        let result = self.collection(collection).delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> BackupResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        let total = documents.len();
        let result = self
            .collection(collection)
            .insert_many(documents)
            .ordered(false)
            .await;

        match result {
            Ok(result) => Ok(result.inserted_ids.len()),
            Err(e) => {
                // Unordered inserts keep going past rejected documents
                if let ErrorKind::InsertMany(failure) = e.kind.as_ref() {
                    let failed = failure.write_errors.as_ref().map_or(0, Vec::len);
                    warn!(
                        "{} of {} documents rejected by {}",
                        failed, total, collection
                    );
                    return Ok(total.saturating_sub(failed));
                }
                Err(e.into())
            }
        }
    }

    async fn count(&self, collection: &str) -> BackupResult<u64> {
        Ok(self.collection(collection).count_documents(doc! {}).await?)
    }

    async fn sample(&self, collection: &str, limit: i64) -> BackupResult<Vec<Document>> {
        let cursor = self
            .collection(collection)
            .find(doc! {})
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}
