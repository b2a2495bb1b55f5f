//! # campus-syncd
//!
//! Headless sync daemon. Opens the local store, loads every collection,
//! follows remote changes and logs notices until interrupted.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use campus_store::Database;
use campus_sync::{NoticeLevel, SyncConfig, SyncEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    campus_sync::init_tracing();

    info!("Starting campus sync v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = SyncConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the store
    // -----------------------------------------------------------------------
    let db = match &config.db_path {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            info!(path = %path.display(), "opening database");
            Database::open_at(path)?
        }
        None => Database::new()?,
    };

    let engine = SyncEngine::new(Arc::new(db), &config);

    // -----------------------------------------------------------------------
    // 4. Initial load and change subscriptions
    // -----------------------------------------------------------------------
    let mut notices = engine.notices();
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => match notice.level {
                    NoticeLevel::Success => info!(message = %notice.message, "notice"),
                    NoticeLevel::Error => warn!(message = %notice.message, "notice"),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "notice listener lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    engine.load_all().await;
    let handle = engine.start_sync().await?;

    info!(
        year = engine.selected_year(),
        subscriptions = handle.len(),
        "campus sync running"
    );

    // -----------------------------------------------------------------------
    // 5. Run until interrupted
    // -----------------------------------------------------------------------
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.shutdown().await;

    Ok(())
}
