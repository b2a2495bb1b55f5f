//! Mirrored collections and session state owned by the engine.
//!
//! [`SyncState`] lives behind the engine's lock. Each collection is only ever
//! replaced wholesale by a reload, never patched in place, and nothing
//! outside the crate gets a mutable handle to it.

use campus_shared::{ClassSchedule, FeeRecord, PromotionSnapshot, Student, Teacher, UserId};

/// In-memory copies of the remote collections, newest first.
#[derive(Debug, Clone)]
pub struct SyncState {
    pub(crate) students: Vec<Student>,
    pub(crate) teachers: Vec<Teacher>,
    pub(crate) fee_records: Vec<FeeRecord>,
    pub(crate) schedules: Vec<ClassSchedule>,
    pub(crate) promotion_history: Vec<PromotionSnapshot>,

    /// Academic year promotions advance from.
    pub(crate) selected_year: i32,

    /// Caller identity supplied by the authentication layer.
    pub(crate) identity: Option<UserId>,
}

impl SyncState {
    /// Create an empty state for the given academic year.
    pub fn new(selected_year: i32, identity: Option<UserId>) -> Self {
        Self {
            students: Vec::new(),
            teachers: Vec::new(),
            fee_records: Vec::new(),
            schedules: Vec::new(),
            promotion_history: Vec::new(),
            selected_year,
            identity,
        }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn fee_records(&self) -> &[FeeRecord] {
        &self.fee_records
    }

    pub fn schedules(&self) -> &[ClassSchedule] {
        &self.schedules
    }

    pub fn promotion_history(&self) -> &[PromotionSnapshot] {
        &self.promotion_history
    }
}
