//! In-memory database and native tool fakes for tests

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::Document;

use super::native::{NativeTool, Tool};
use super::DocumentDatabase;
use crate::error::{BackupError, BackupResult};

/// Collections held in a map, in insertion order per collection
pub struct MemoryDatabase {
    name: String,
    collections: Mutex<BTreeMap<String, Vec<Document>>>,
}

impl MemoryDatabase {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            collections: Mutex::new(BTreeMap::new()),
        }
    }

    /// Append documents, creating the collection if needed
    pub fn seed(&self, collection: &str, documents: Vec<Document>) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentDatabase for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collection_names(&self) -> BackupResult<Vec<String>> {
        Ok(self.collections.lock().unwrap().keys().cloned().collect())
    }

    async fn find_all(&self, collection: &str) -> BackupResult<Vec<Document>> {
        Ok(self.documents(collection))
    }

    async fn delete_all(&self, collection: &str) -> BackupResult<u64> {
        let mut collections = self.collections.lock().unwrap();
        let removed = collections
            .get_mut(collection)
            .map(|docs| std::mem::take(docs).len())
            .unwrap_or(0);
        Ok(removed as u64)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> BackupResult<usize> {
        let count = documents.len();
        self.seed(collection, documents);
        Ok(count)
    }

    async fn count(&self, collection: &str) -> BackupResult<u64> {
        Ok(self.documents(collection).len() as u64)
    }

    async fn sample(&self, collection: &str, limit: i64) -> BackupResult<Vec<Document>> {
        Ok(self
            .documents(collection)
            .into_iter()
            .take(limit.max(0) as usize)
            .collect())
    }
}

/// Scripted stand-in for mongodump/mongorestore
pub struct FakeTools {
    available: bool,
    succeed: bool,
    dumps: AtomicUsize,
    restores: AtomicUsize,
}

impl FakeTools {
    fn with(available: bool, succeed: bool) -> Self {
        Self {
            available,
            succeed,
            dumps: AtomicUsize::new(0),
            restores: AtomicUsize::new(0),
        }
    }

    /// Installed and succeeding
    pub fn working() -> Self {
        Self::with(true, true)
    }

    /// Not installed
    pub fn missing() -> Self {
        Self::with(false, false)
    }

    /// Installed but every run fails after writing partial output
    pub fn failing() -> Self {
        Self::with(true, false)
    }

    pub fn dump_calls(&self) -> usize {
        self.dumps.load(Ordering::SeqCst)
    }

    pub fn restore_calls(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NativeTool for FakeTools {
    async fn probe(&self, _tool: Tool) -> bool {
        self.available
    }

    async fn dump(&self, out_dir: &Path) -> BackupResult<()> {
        self.dumps.fetch_add(1, Ordering::SeqCst);
        let db_dir = out_dir.join("gamevault");
        fs::create_dir_all(&db_dir)?;
        fs::write(db_dir.join("games.bson"), b"\x05\x00\x00\x00\x00")?;

        if self.succeed {
            fs::write(db_dir.join("games.metadata.json"), b"{}")?;
            Ok(())
        } else {
            Err(BackupError::Tool("mongodump exited with 1".into()))
        }
    }

    async fn restore(&self, _dump_dir: &Path) -> BackupResult<()> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(())
        } else {
            Err(BackupError::Tool("mongorestore exited with 1".into()))
        }
    }
}
