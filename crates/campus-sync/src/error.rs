use chrono::NaiveTime;
use thiserror::Error;

use campus_shared::constants::day_name;
use campus_shared::ClassLevel;
use campus_store::{Collection, StoreError};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Registration ID already exists: {0}")]
    DuplicateRegistrationId(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error(
        "A schedule already exists for {class} on {} at {}",
        day_name(*day_of_week),
        start_time.format("%H:%M")
    )]
    ScheduleSlotTaken {
        class: ClassLevel,
        day_of_week: u8,
        start_time: NaiveTime,
    },

    #[error("No promotion history found")]
    NothingToUndo,

    #[error("Could not confirm registration ID availability: {0}")]
    AvailabilityUnknown(#[source] StoreError),

    #[error("Could not record promotion snapshot: {0}")]
    SnapshotFailed(#[source] StoreError),

    #[error("Promotion stopped after {applied} of {total} students: {source}")]
    PartialPromotion {
        applied: usize,
        total: usize,
        source: StoreError,
    },

    #[error("Undo stopped after {applied} of {total} students: {source}")]
    PartialUndo {
        applied: usize,
        total: usize,
        source: StoreError,
    },

    #[error("Change subscriptions are already running")]
    AlreadySyncing,

    #[error("Could not decode {collection} row: {source}")]
    Decode {
        collection: Collection,
        source: serde_json::Error,
    },

    #[error("Could not encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Validation and constraint failures whose own text is meant for the
    /// person at the keyboard.
    pub fn is_user_presentable(&self) -> bool {
        matches!(
            self,
            SyncError::DuplicateRegistrationId(_)
                | SyncError::MissingField(_)
                | SyncError::InvalidField { .. }
                | SyncError::ScheduleSlotTaken { .. }
                | SyncError::NothingToUndo
        )
    }

    /// Message shown to the caller: the error itself when presentable,
    /// otherwise the operation's generic failure text.
    pub fn user_message(&self, fallback: &str) -> String {
        if self.is_user_presentable() {
            self.to_string()
        } else {
            fallback.to_string()
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
