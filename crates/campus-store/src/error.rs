use thiserror::Error;

use crate::collection::Collection;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected a row but found none.
    #[error("Record not found")]
    NotFound,

    /// A write collided with a uniqueness constraint.
    #[error("Unique constraint violated on {collection}: {message}")]
    UniqueViolation {
        collection: Collection,
        message: String,
    },

    /// A row or filter referenced a column the collection does not have.
    #[error("Unknown column `{column}` on {collection}")]
    UnknownColumn {
        collection: Collection,
        column: String,
    },

    /// A row value could not be mapped to or from its column type.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// JSON encoding error for JSON-typed columns.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The connection mutex was poisoned by a panicking writer.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// The store could not be reached or refused the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether this is the store's uniqueness-violation signal.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
