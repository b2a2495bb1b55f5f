//! The record store contract consumed by the sync engine.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::collection::Collection;
use crate::error::{Result, StoreError};

/// A single record as exchanged with the store: a JSON object keyed by
/// column name.
pub type Row = Map<String, Value>;

/// Remote persistent store with per-row CRUD and change notifications.
///
/// Implementations must surface uniqueness violations as
/// [`StoreError::UniqueViolation`] and empty single-row lookups as
/// [`StoreError::NotFound`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every row of `collection`, newest first.
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Row>>;

    /// Insert a row and return it as stored.
    async fn insert(&self, collection: Collection, row: Row) -> Result<Row>;

    /// Apply `patch` to the row with the given id. Fails with
    /// [`StoreError::NotFound`] if no such row exists.
    async fn update(&self, collection: Collection, id: Uuid, patch: Row) -> Result<()>;

    /// Delete a row. Returns `true` if a row was removed.
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool>;

    async fn query(&self, collection: Collection, query: Query) -> Result<Vec<Row>>;

    /// Open a change feed that fires whenever `collection` changes.
    async fn subscribe(&self, collection: Collection) -> Result<ChangeFeed>;

    /// First row matching `query`, or [`StoreError::NotFound`].
    async fn query_one(&self, collection: Collection, query: Query) -> Result<Row> {
        self.query(collection, query.limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: Op,
    pub value: Value,
}

/// Conjunctive filter with optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
    /// `(column, descending)`
    pub order_by: Option<(String, bool)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            op: Op::Eq,
            value: value.into(),
        });
        self
    }

    pub fn neq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            op: Op::Neq,
            value: value.into(),
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order_by = Some((column.to_string(), true));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

// ---------------------------------------------------------------------------
// Change feed
// ---------------------------------------------------------------------------

/// Receiver half of a per-collection change notification channel.
///
/// Notifications carry no payload beyond "this collection changed".
pub struct ChangeFeed {
    collection: Collection,
    rx: broadcast::Receiver<Collection>,
}

impl ChangeFeed {
    pub fn new(collection: Collection, rx: broadcast::Receiver<Collection>) -> Self {
        Self { collection, rx }
    }

    /// Wait for the next change. Returns `false` once the store's sender has
    /// gone away.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.rx.recv().await {
                Ok(c) if c == self.collection => return true,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    // Missed notifications collapse into one reload.
                    tracing::debug!(collection = %self.collection, skipped, "change feed lagged");
                    return true;
                }
                Err(RecvError::Closed) => return false,
            }
        }
    }
}
