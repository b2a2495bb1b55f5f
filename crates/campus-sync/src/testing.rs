//! Test fixtures and a fault-injecting store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use uuid::Uuid;

use campus_shared::{
    ClassLevel, FeeStatus, NewFeeRecord, NewSchedule, NewStudent, NewTeacher, StudentStatus,
    TeacherStatus,
};
use campus_store::{ChangeFeed, Collection, Database, Query, RecordStore, Row, StoreError};

use crate::config::SyncConfig;
use crate::engine::SyncEngine;

pub const YEAR: i32 = 2024;

pub fn engine_on(store: Arc<dyn RecordStore>) -> SyncEngine {
    let config = SyncConfig {
        academic_year: YEAR,
        ..SyncConfig::default()
    };
    SyncEngine::new(store, &config)
}

pub fn new_student(registration_id: &str, class: ClassLevel) -> NewStudent {
    NewStudent {
        registration_id: registration_id.to_string(),
        name: format!("Student {registration_id}"),
        father_name: "Guardian".to_string(),
        phone_number: "0300-0000000".to_string(),
        class,
        status: StudentStatus::Active,
        joining_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
        academic_year: YEAR,
    }
}

pub fn new_teacher(name: &str, phone_number: Option<&str>) -> NewTeacher {
    NewTeacher {
        name: name.to_string(),
        phone_number: phone_number.map(str::to_string),
        joining_date: NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
        status: TeacherStatus::Active,
    }
}

pub fn new_fee(student_id: Uuid, month: u32, status: FeeStatus) -> NewFeeRecord {
    NewFeeRecord {
        student_id,
        month,
        year: YEAR,
        amount: 2500.0,
        status,
    }
}

/// A one-hour slot starting at `start` ("HH:MM").
pub fn new_schedule(class: ClassLevel, day_of_week: u8, start: &str) -> NewSchedule {
    let start_time = NaiveTime::parse_from_str(start, "%H:%M").unwrap();
    NewSchedule {
        class,
        day_of_week,
        start_time,
        end_time: start_time + Duration::hours(1),
        subject: "Mathematics".to_string(),
        teacher_id: None,
    }
}

/// In-memory [`Database`] with switchable failures.
pub struct FaultyStore {
    inner: Database,
    updates: AtomicUsize,
    fail_update_at: Mutex<Option<usize>>,
    fail_inserts_into: Mutex<Option<Collection>>,
    fail_queries: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: Database::open_in_memory().unwrap(),
            updates: AtomicUsize::new(0),
            fail_update_at: Mutex::new(None),
            fail_inserts_into: Mutex::new(None),
            fail_queries: AtomicBool::new(false),
        }
    }

    /// Fail the update call with this zero-based index, counted from now.
    pub fn fail_update_at(&self, index: Option<usize>) {
        self.updates.store(0, Ordering::SeqCst);
        *self.fail_update_at.lock().unwrap() = index;
    }

    pub fn fail_inserts_into(&self, collection: Option<Collection>) {
        *self.fail_inserts_into.lock().unwrap() = collection;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn injected(what: &str) -> StoreError {
        StoreError::Unavailable(format!("injected {what} failure"))
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn fetch_all(&self, collection: Collection) -> campus_store::Result<Vec<Row>> {
        self.inner.fetch_all(collection).await
    }

    async fn insert(&self, collection: Collection, row: Row) -> campus_store::Result<Row> {
        if *self.fail_inserts_into.lock().unwrap() == Some(collection) {
            return Err(Self::injected("insert"));
        }
        self.inner.insert(collection, row).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Row,
    ) -> campus_store::Result<()> {
        let index = self.updates.fetch_add(1, Ordering::SeqCst);
        if *self.fail_update_at.lock().unwrap() == Some(index) {
            return Err(Self::injected("update"));
        }
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> campus_store::Result<bool> {
        self.inner.delete(collection, id).await
    }

    async fn query(&self, collection: Collection, query: Query) -> campus_store::Result<Vec<Row>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Self::injected("query"));
        }
        self.inner.query(collection, query).await
    }

    async fn subscribe(&self, collection: Collection) -> campus_store::Result<ChangeFeed> {
        self.inner.subscribe(collection).await
    }
}
