//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. It also owns the sending
//! half of the change-notification channel; every committed write publishes
//! the affected [`Collection`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use directories::ProjectDirs;
use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::collection::Collection;
use crate::error::{Result, StoreError};
use crate::migrations;

/// Buffered notifications per subscriber before it starts lagging.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// SQLite-backed record store.
pub struct Database {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<Collection>,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/campus/campus.db`
    /// - macOS:   `~/Library/Application Support/com.campus.campus/campus.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\campus\campus\data\campus.db`
    pub fn new() -> Result<Self> {
        let path = Self::default_path()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        tracing::info!(path = %path.display(), "opening database");

        Self::open_at(&path)
    }

    /// Location of the default database file.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("com", "campus", "campus").ok_or(StoreError::NoDataDir)?;
        Ok(project_dirs.data_dir().join("campus.db"))
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            conn: Mutex::new(conn),
            changes,
        })
    }

    /// Lock the underlying connection.
    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    /// Publish a change notification. Having no subscribers is not an error.
    pub(crate) fn notify(&self, collection: Collection) {
        let receivers = self.changes.send(collection).unwrap_or(0);
        tracing::trace!(%collection, receivers, "change published");
    }

    pub(crate) fn change_receiver(&self) -> broadcast::Receiver<Collection> {
        self.changes.subscribe()
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn()
            .ok()
            .and_then(|conn| conn.path().map(PathBuf::from))
    }
}
