//! Backup CLI commands
//!
//! Bridges the parsed action with the backup and restore managers.

use std::sync::Arc;

use chrono::Utc;

use crate::backup::{BackupCatalog, BackupManager, RestoreManager};
use crate::config::Settings;
use crate::database::DatabaseSnapshotter;
use crate::display::{
    format_backup_list, format_backup_report, format_complete_restore, format_restore,
};
use crate::error::BackupResult;
use crate::storage::ObjectStore;

use super::args::Action;
use super::debug::games_report;

/// List artifacts in the backup bucket
///
/// Needs only the object store, so it runs without a database connection.
pub async fn handle_list(settings: &Settings, store: Arc<dyn ObjectStore>) -> BackupResult<()> {
    let output = list_output(settings, store).await?;
    println!("{}", output);
    Ok(())
}

async fn list_output(settings: &Settings, store: Arc<dyn ObjectStore>) -> BackupResult<String> {
    let catalog = BackupCatalog::new(store, settings.backup_bucket.clone());
    let artifacts = catalog.list().await?;
    Ok(format_backup_list(&artifacts, Utc::now()))
}

/// Handle a backup or restore action
pub async fn handle_backup_action(
    settings: &Settings,
    store: Arc<dyn ObjectStore>,
    snapshotter: Arc<DatabaseSnapshotter>,
    action: &Action,
) -> BackupResult<()> {
    let output = run_action(settings, store, snapshotter, action).await?;
    print!("{}", output);
    Ok(())
}

async fn run_action(
    settings: &Settings,
    store: Arc<dyn ObjectStore>,
    snapshotter: Arc<DatabaseSnapshotter>,
    action: &Action,
) -> BackupResult<String> {
    match action {
        Action::Manual => {
            let manager = BackupManager::new(settings, store, snapshotter);
            let report = manager.create_full_backup().await?;
            Ok(format_backup_report(&report))
        }

        Action::List => Ok(format!("{}\n", list_output(settings, store).await?)),

        Action::Restore { name } => {
            let manager = RestoreManager::new(settings, store, snapshotter);
            let restored = manager.restore_from_backup(name.as_deref()).await?;
            Ok(format_restore(&restored))
        }

        Action::RestoreComplete { database, store: store_name } => {
            let manager = RestoreManager::new(settings, store, snapshotter);
            let restored = manager
                .restore_complete(database.as_deref(), store_name.as_deref())
                .await?;
            Ok(format_complete_restore(&restored))
        }

        Action::RestoreDate { date } => {
            let manager = RestoreManager::new(settings, store, snapshotter);
            let restored = manager.restore_from_date(date).await?;
            Ok(format_complete_restore(&restored))
        }

        Action::Debug => Ok(format!("{}\n", games_report(snapshotter.database()).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::test_settings;
    use crate::error::BackupError;
    use crate::database::memory::{FakeTools, MemoryDatabase};
    use crate::storage::memory::MemoryStore;
    use mongodb::bson::{doc, oid::ObjectId};
    use tempfile::TempDir;

    struct Fixture {
        settings: Settings,
        store: Arc<MemoryStore>,
        db: Arc<MemoryDatabase>,
        snapshotter: Arc<DatabaseSnapshotter>,
        _temp: TempDir,
    }

    async fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let settings = test_settings(temp.path().join("backups"));
        let store = Arc::new(MemoryStore::new());
        store.create_bucket(&settings.backup_bucket).await.unwrap();
        let db = Arc::new(MemoryDatabase::new("gamevault"));
        let snapshotter = Arc::new(DatabaseSnapshotter::new(
            db.clone(),
            Arc::new(FakeTools::missing()),
        ));
        Fixture {
            settings,
            store,
            db,
            snapshotter,
            _temp: temp,
        }
    }

    async fn run(f: &Fixture, action: Action) -> BackupResult<String> {
        run_action(&f.settings, f.store.clone(), f.snapshotter.clone(), &action).await
    }

    #[tokio::test]
    async fn test_list_without_backups() {
        let f = fixture().await;
        let output = run(&f, Action::List).await.unwrap();
        assert!(output.contains("No backups found."));
    }

    #[tokio::test]
    async fn test_manual_then_list() {
        let f = fixture().await;
        f.db.seed(
            "games",
            vec![doc! { "_id": ObjectId::new(), "title": "Celeste" }],
        );
        f.store.insert("games", "covers/celeste.png", b"png");

        let report = run(&f, Action::Manual).await.unwrap();
        assert!(report.contains("Backup complete"));
        assert!(report.contains("1 objects"));

        let listing = run(&f, Action::List).await.unwrap();
        assert!(listing.contains("mongodb_"));
        assert!(listing.contains("r2_"));
        assert!(listing.contains("Total: 2 backup(s)"));
    }

    #[tokio::test]
    async fn test_debug_lists_games() {
        let f = fixture().await;
        f.db.seed("games", vec![doc! { "_id": "celeste", "title": "Celeste" }]);

        let output = run(&f, Action::Debug).await.unwrap();
        assert!(output.contains("1. Celeste"));
        assert!(output.contains("ID type: string"));
    }

    #[tokio::test]
    async fn test_restore_without_backups_fails() {
        let f = fixture().await;
        let err = run(&f, Action::Restore { name: None }).await.unwrap_err();
        assert!(matches!(err, BackupError::NoBackups));
    }

    #[tokio::test]
    async fn test_restore_date_rejects_bad_date() {
        let f = fixture().await;
        let err = run(
            &f,
            Action::RestoreDate {
                date: "31-05-2025".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BackupError::InvalidDate(_)));
    }
}
