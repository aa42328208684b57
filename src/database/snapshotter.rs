//! Chooses between the native tools and the in-process snapshot path

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::Bson;
use tracing::{info, warn};

use super::native::{NativeTool, Tool};
use super::snapshot::{DatabaseSnapshot, SNAPSHOT_FILE};
use super::DocumentDatabase;
use crate::error::{BackupError, BackupResult};

/// Identifiers logged per restored collection
const SAMPLE_SIZE: i64 = 3;

/// How a dump was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpOutcome {
    /// `mongodump` wrote a native dump tree
    Native,
    /// `backup.json` was written in-process
    Fallback { collections: usize, documents: usize },
}

/// Result of restoring one collection from a JSON snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRestore {
    pub name: String,
    /// Documents present in the snapshot
    pub expected: usize,
    /// Documents counted after insertion
    pub restored: u64,
    pub sample_ids: Vec<String>,
}

/// How a database artifact was restored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Native,
    Direct(Vec<CollectionRestore>),
}

/// Dumps and restores the catalog database
pub struct DatabaseSnapshotter {
    database: Arc<dyn DocumentDatabase>,
    tools: Arc<dyn NativeTool>,
}

impl DatabaseSnapshotter {
    pub fn new(database: Arc<dyn DocumentDatabase>, tools: Arc<dyn NativeTool>) -> Self {
        Self { database, tools }
    }

    /// The database being snapshotted
    pub fn database(&self) -> &dyn DocumentDatabase {
        self.database.as_ref()
    }

    /// Dump the database into `dir`
    ///
    /// Uses `mongodump` when it is installed. A missing or failing tool falls
    /// back to writing `backup.json`; the directory is emptied first so a
    /// partial native dump never ends up next to the snapshot.
    pub async fn dump(&self, dir: &Path) -> BackupResult<DumpOutcome> {
        fs::create_dir_all(dir).map_err(|e| {
            BackupError::Io(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        if self.tools.probe(Tool::Dump).await {
            match self.tools.dump(dir).await {
                Ok(()) => {
                    info!("Native dump written to {}", dir.display());
                    return Ok(DumpOutcome::Native);
                }
                Err(e) => {
                    warn!("mongodump failed ({}), falling back to in-process dump", e);
                    reset_dir(dir)?;
                }
            }
        } else {
            info!("mongodump not available, using in-process dump");
        }

        let snapshot = self.export().await?;
        let collections = snapshot.collections.len();
        let documents = snapshot.document_count();
        let path = snapshot.write_to(dir)?;

        info!(
            "Wrote {} documents from {} collections to {}",
            documents,
            collections,
            path.display()
        );
        Ok(DumpOutcome::Fallback {
            collections,
            documents,
        })
    }

    /// Read every user collection into a snapshot
    pub async fn export(&self) -> BackupResult<DatabaseSnapshot> {
        let mut snapshot = DatabaseSnapshot::new(self.database.name(), Utc::now());

        for name in self.database.collection_names().await? {
            let documents = self.database.find_all(&name).await?;
            info!("Exported {} documents from {}", documents.len(), name);
            snapshot.insert_collection(name, documents);
        }

        Ok(snapshot)
    }

    /// Restore an extracted database artifact
    ///
    /// A top-level `backup.json` is restored in-process; anything else is
    /// treated as a native dump tree and requires `mongorestore`.
    pub async fn restore_dir(&self, dir: &Path) -> BackupResult<RestoreOutcome> {
        let snapshot_path = dir.join(SNAPSHOT_FILE);
        if snapshot_path.is_file() {
            info!("Restoring from {}", snapshot_path.display());
            let snapshot = DatabaseSnapshot::read_from(&snapshot_path)?;
            return Ok(RestoreOutcome::Direct(self.restore_snapshot(snapshot).await?));
        }

        if !self.tools.probe(Tool::Restore).await {
            return Err(BackupError::ToolUnavailable(format!(
                "{} is required to restore the native dump in {}",
                Tool::Restore.program(),
                dir.display()
            )));
        }

        self.tools.restore(dir).await?;
        info!("Native restore completed");
        Ok(RestoreOutcome::Native)
    }

    /// Replace each collection's contents with the snapshot's documents
    pub async fn restore_snapshot(
        &self,
        snapshot: DatabaseSnapshot,
    ) -> BackupResult<Vec<CollectionRestore>> {
        let mut results = Vec::new();

        for (name, documents) in snapshot.into_documents() {
            let expected = documents.len();

            let removed = self.database.delete_all(&name).await?;
            info!("Cleared {} documents from {}", removed, name);

            if expected > 0 {
                self.database.insert_many(&name, documents).await?;
            }

            let restored = self.database.count(&name).await?;
            let sample_ids: Vec<String> = self
                .database
                .sample(&name, SAMPLE_SIZE)
                .await?
                .iter()
                .filter_map(|doc| doc.get("_id").map(id_string))
                .collect();

            if restored as usize == expected {
                info!("Restored {} documents into {}", restored, name);
            } else {
                warn!(
                    "Restored {} of {} documents into {}",
                    restored, expected, name
                );
            }
            if !sample_ids.is_empty() {
                info!("Sample ids in {}: {}", name, sample_ids.join(", "));
            }

            results.push(CollectionRestore {
                name,
                expected,
                restored,
                sample_ids,
            });
        }

        Ok(results)
    }
}

fn id_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn reset_dir(dir: &Path) -> BackupResult<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| {
            BackupError::Io(format!("Failed to clear {}: {}", dir.display(), e))
        })?;
    }
    fs::create_dir_all(dir)
        .map_err(|e| BackupError::Io(format!("Failed to create {}: {}", dir.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::{FakeTools, MemoryDatabase};
    use mongodb::bson::{doc, oid::ObjectId};
    use tempfile::TempDir;

    fn seeded() -> Arc<MemoryDatabase> {
        let db = MemoryDatabase::new("gamevault");
        db.seed(
            "games",
            (0..5)
                .map(|i| doc! { "_id": ObjectId::new(), "title": format!("Game {}", i) })
                .collect(),
        );
        db.seed("users", vec![doc! { "_id": "admin", "role": "owner" }]);
        Arc::new(db)
    }

    fn snapshotter(db: &Arc<MemoryDatabase>, tools: &Arc<FakeTools>) -> DatabaseSnapshotter {
        DatabaseSnapshotter::new(db.clone(), tools.clone())
    }

    #[tokio::test]
    async fn test_dump_uses_native_tool_when_available() {
        let temp = TempDir::new().unwrap();
        let db = seeded();
        let tools = Arc::new(FakeTools::working());

        let outcome = snapshotter(&db, &tools).dump(temp.path()).await.unwrap();

        assert_eq!(outcome, DumpOutcome::Native);
        assert_eq!(tools.dump_calls(), 1);
        assert!(!temp.path().join(SNAPSHOT_FILE).exists());
    }

    #[tokio::test]
    async fn test_dump_falls_back_when_tool_missing() {
        let temp = TempDir::new().unwrap();
        let db = seeded();
        let tools = Arc::new(FakeTools::missing());

        let outcome = snapshotter(&db, &tools).dump(temp.path()).await.unwrap();

        assert_eq!(
            outcome,
            DumpOutcome::Fallback {
                collections: 2,
                documents: 6
            }
        );
        assert_eq!(tools.dump_calls(), 0);
        assert!(temp.path().join(SNAPSHOT_FILE).is_file());
    }

    #[tokio::test]
    async fn test_dump_falls_back_when_tool_fails() {
        let temp = TempDir::new().unwrap();
        let db = seeded();
        let tools = Arc::new(FakeTools::failing());

        let outcome = snapshotter(&db, &tools).dump(temp.path()).await.unwrap();

        assert!(matches!(outcome, DumpOutcome::Fallback { documents: 6, .. }));
        assert_eq!(tools.dump_calls(), 1);
        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "partial native output must be cleared");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dump_falls_back_when_tool_times_out() {
        use crate::database::native::{stalled_tool, MongoTools};
        use std::time::Duration;

        let bin = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let script = stalled_tool(bin.path()).display().to_string();
        let tools = MongoTools::new("mongodb://db/games", Duration::from_secs(1))
            .with_programs(script.clone(), script);
        let snapshotter = DatabaseSnapshotter::new(seeded(), Arc::new(tools));

        let outcome = snapshotter.dump(out.path()).await.unwrap();

        assert_eq!(
            outcome,
            DumpOutcome::Fallback {
                collections: 2,
                documents: 6
            }
        );
        assert!(out.path().join(SNAPSHOT_FILE).is_file());
        assert!(!out.path().join("partial.bson").exists());
    }

    #[tokio::test]
    async fn test_dump_then_restore_preserves_ids() {
        let temp = TempDir::new().unwrap();
        let db = seeded();
        let tools = Arc::new(FakeTools::missing());
        let snapshotter = snapshotter(&db, &tools);

        let before: Vec<Bson> = db.documents("games").iter().map(|d| d.get("_id").cloned().unwrap()).collect();
        snapshotter.dump(temp.path()).await.unwrap();

        db.seed("games", vec![doc! { "_id": ObjectId::new(), "title": "Intruder" }]);

        let outcome = snapshotter.restore_dir(temp.path()).await.unwrap();
        let results = match outcome {
            RestoreOutcome::Direct(results) => results,
            RestoreOutcome::Native => panic!("expected in-process restore"),
        };

        let games = results.iter().find(|r| r.name == "games").unwrap();
        assert_eq!(games.expected, 5);
        assert_eq!(games.restored, 5);
        assert_eq!(games.sample_ids.len(), 3);

        let after: Vec<Bson> = db.documents("games").iter().map(|d| d.get("_id").cloned().unwrap()).collect();
        assert_eq!(before, after);
        assert_eq!(db.documents("users")[0].get_str("_id").unwrap(), "admin");
    }

    #[tokio::test]
    async fn test_restore_empty_collection_clears_it() {
        let db = seeded();
        let tools = Arc::new(FakeTools::missing());

        let mut snapshot = DatabaseSnapshot::new("gamevault", Utc::now());
        snapshot.insert_collection("games", Vec::new());

        let results = snapshotter(&db, &tools)
            .restore_snapshot(snapshot)
            .await
            .unwrap();

        assert_eq!(results[0].restored, 0);
        assert!(db.documents("games").is_empty());
        assert_eq!(db.documents("users").len(), 1);
    }

    #[tokio::test]
    async fn test_native_restore_used_without_snapshot_file() {
        let temp = TempDir::new().unwrap();
        let db = seeded();
        let tools = Arc::new(FakeTools::working());

        let outcome = snapshotter(&db, &tools).restore_dir(temp.path()).await.unwrap();

        assert_eq!(outcome, RestoreOutcome::Native);
        assert_eq!(tools.restore_calls(), 1);
    }

    #[tokio::test]
    async fn test_native_restore_requires_tool() {
        let temp = TempDir::new().unwrap();
        let db = seeded();
        let tools = Arc::new(FakeTools::missing());

        let err = snapshotter(&db, &tools)
            .restore_dir(temp.path())
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::ToolUnavailable(_)));
        assert_eq!(tools.restore_calls(), 0);
        assert_eq!(db.documents("games").len(), 5);
    }
}
