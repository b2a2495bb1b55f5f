//! The sync engine: mirrored collections kept consistent with the store.
//!
//! Every collection is refreshed by a full refetch, both after local writes
//! and whenever the store's change feed reports that something changed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use campus_shared::UserId;
use campus_store::{Collection, RecordStore, Row};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::events::{Notice, Notifier};
use crate::state::SyncState;

/// Cheaply cloneable handle to the engine. Clones share the same store,
/// mirrored state and notice channel.
#[derive(Clone)]
pub struct SyncEngine {
    pub(crate) store: Arc<dyn RecordStore>,
    state: Arc<RwLock<SyncState>>,
    notifier: Notifier,
    /// Set while a [`SyncHandle`] is alive.
    syncing: Arc<AtomicBool>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn RecordStore>, config: &SyncConfig) -> Self {
        Self {
            store,
            state: Arc::new(RwLock::new(SyncState::new(
                config.academic_year,
                config.identity.clone(),
            ))),
            notifier: Notifier::new(config.notice_capacity),
            syncing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Listen for success and failure notices.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notifier.subscribe()
    }

    pub fn selected_year(&self) -> i32 {
        self.read_state().selected_year
    }

    pub fn set_selected_year(&self, year: i32) {
        self.write_state().selected_year = year;
    }

    pub fn identity(&self) -> Option<UserId> {
        self.read_state().identity.clone()
    }

    pub fn set_identity(&self, identity: Option<UserId>) {
        self.write_state().identity = identity;
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Replace one mirrored collection with a fresh full fetch.
    ///
    /// On failure the previous copy is kept.
    pub async fn reload(&self, collection: Collection) -> Result<()> {
        let rows = self.store.fetch_all(collection).await?;
        let count = rows.len();

        match collection {
            Collection::Students => {
                let students = decode_rows(collection, rows)?;
                self.write_state().students = students;
            }
            Collection::Teachers => {
                let teachers = decode_rows(collection, rows)?;
                self.write_state().teachers = teachers;
            }
            Collection::FeeRecords => {
                let records = decode_rows(collection, rows)?;
                self.write_state().fee_records = records;
            }
            Collection::ClassSchedules => {
                let schedules = decode_rows(collection, rows)?;
                self.write_state().schedules = schedules;
            }
            Collection::PromotionHistory => {
                let history = decode_rows(collection, rows)?;
                self.write_state().promotion_history = history;
            }
        }

        debug!(%collection, count, "collection reloaded");
        Ok(())
    }

    /// Reload and log instead of failing. Used after writes that have
    /// already committed.
    pub(crate) async fn refresh(&self, collection: Collection) {
        if let Err(e) = self.reload(collection).await {
            error!(%collection, error = %e, "Error loading collection");
        }
    }

    /// Initial load of every collection. Each reload is independent; a
    /// failure in one leaves the others untouched.
    pub async fn load_all(&self) {
        tokio::join!(
            self.refresh(Collection::Students),
            self.refresh(Collection::Teachers),
            self.refresh(Collection::FeeRecords),
            self.refresh(Collection::ClassSchedules),
            self.refresh(Collection::PromotionHistory),
        );

        let state = self.read_state();
        info!(
            students = state.students.len(),
            teachers = state.teachers.len(),
            fee_records = state.fee_records.len(),
            schedules = state.schedules.len(),
            promotions = state.promotion_history.len(),
            "initial load complete"
        );
    }

    // ------------------------------------------------------------------
    // Change subscriptions
    // ------------------------------------------------------------------

    /// Subscribe to every live collection. Each change notification
    /// triggers a full reload of that collection.
    ///
    /// Only one set of subscriptions runs per engine. A second call fails
    /// with [`SyncError::AlreadySyncing`] until the first handle is shut
    /// down or dropped.
    pub async fn start_sync(&self) -> Result<SyncHandle> {
        if self.syncing.swap(true, Ordering::SeqCst) {
            return Err(SyncError::AlreadySyncing);
        }
        let mut handle = SyncHandle {
            tasks: Vec::new(),
            active: self.syncing.clone(),
        };

        for collection in Collection::SUBSCRIBED {
            // On error `handle` drops here and aborts the tasks already spawned.
            let mut feed = self.store.subscribe(collection).await?;
            let engine = self.clone();

            handle.tasks.push(tokio::spawn(async move {
                while feed.changed().await {
                    debug!(%collection, "remote change received");
                    engine.refresh(collection).await;
                }
                warn!(%collection, "change feed closed");
            }));
        }

        info!(count = handle.tasks.len(), "change subscriptions established");
        Ok(handle)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, SyncState> {
        // A panic mid-reload cannot leave a half-written Vec behind, so the
        // data under a poisoned lock is still whole.
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SyncState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit the notice for an operation's outcome and hand the outcome back.
    pub(crate) fn report<T>(
        &self,
        outcome: Result<T>,
        success: &str,
        failure: &str,
    ) -> Result<T> {
        match &outcome {
            Ok(_) => self.notifier.success(success),
            Err(e) => {
                if e.is_user_presentable() {
                    warn!(error = %e, "{failure}");
                } else {
                    error!(error = %e, "{failure}");
                }
                self.notifier.error(e.user_message(failure));
            }
        }
        outcome
    }
}

/// Running change subscriptions. Dropping the handle tears them all down.
pub struct SyncHandle {
    tasks: Vec<JoinHandle<()>>,
    active: Arc<AtomicBool>,
}

impl SyncHandle {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop every subscription and wait for the tasks to wind down.
    pub async fn shutdown(mut self) {
        let tasks = std::mem::take(&mut self.tasks);
        for task in &tasks {
            task.abort();
        }
        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    warn!(error = %e, "subscription task failed");
                }
            }
        }
        info!("change subscriptions closed");
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        self.active.store(false, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

pub(crate) fn decode_rows<T: DeserializeOwned>(
    collection: Collection,
    rows: Vec<Row>,
) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| decode_row(collection, row))
        .collect()
}

pub(crate) fn decode_row<T: DeserializeOwned>(collection: Collection, row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row))
        .map_err(|source| SyncError::Decode { collection, source })
}

pub(crate) fn encode<T: Serialize>(record: &T) -> Result<Row> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        _ => Err(SyncError::Encode(<serde_json::Error as serde::ser::Error>::custom(
            "record did not serialize to an object",
        ))),
    }
}
