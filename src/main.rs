use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use gamevault::cli::{handle_backup_action, handle_list, usage, Action, Cli};
use gamevault::config::Settings;
use gamevault::database::{DatabaseSnapshotter, MongoDatabase, MongoTools};
use gamevault::storage::{ObjectStore, S3Store};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Usage errors share the exit code of every other fatal error
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    let Some(action) = cli.action() else {
        print!("{}", usage());
        return Ok(());
    };

    init_logging();

    let settings = Settings::from_env()?;
    let store: Arc<dyn ObjectStore> = Arc::new(S3Store::new(&settings.storage));

    if action == Action::List {
        handle_list(&settings, store).await?;
        return Ok(());
    }

    let database = Arc::new(MongoDatabase::connect(&settings.mongodb_uri).await?);
    let tools = Arc::new(MongoTools::new(
        settings.mongodb_uri.clone(),
        settings.native_tool_timeout,
    ));
    let snapshotter = Arc::new(DatabaseSnapshotter::new(database, tools));

    handle_backup_action(&settings, store, snapshotter, &action).await?;
    Ok(())
}

/// Log to stderr, `info` unless `RUST_LOG` says otherwise
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
