//! Entity models mirrored from the record store.
//!
//! Field names match the store's column names so that every struct can be
//! converted to and from a store row with `serde_json`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::types::{ClassLevel, FeeStatus, StudentStatus, TeacherStatus, UserId};

// ---------------------------------------------------------------------------
// Student
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
    pub id: Uuid,
    /// School-assigned registration number. Unique across all students.
    pub registration_id: String,
    pub name: String,
    /// Guardian's name.
    pub father_name: String,
    pub phone_number: String,
    pub class: ClassLevel,
    pub status: StudentStatus,
    pub joining_date: NaiveDate,
    pub academic_year: i32,
    pub created_at: DateTime<Utc>,
}

/// The writable fields of a [`Student`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewStudent {
    pub registration_id: String,
    pub name: String,
    pub father_name: String,
    pub phone_number: String,
    pub class: ClassLevel,
    pub status: StudentStatus,
    pub joining_date: NaiveDate,
    pub academic_year: i32,
}

impl Student {
    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }

    pub fn draft(&self) -> NewStudent {
        NewStudent {
            registration_id: self.registration_id.clone(),
            name: self.name.clone(),
            father_name: self.father_name.clone(),
            phone_number: self.phone_number.clone(),
            class: self.class,
            status: self.status,
            joining_date: self.joining_date,
            academic_year: self.academic_year,
        }
    }
}

// ---------------------------------------------------------------------------
// Teacher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Teacher {
    pub id: Uuid,
    pub name: String,
    /// Never null in the store; missing numbers are empty strings.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone_number: String,
    pub joining_date: NaiveDate,
    pub status: TeacherStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTeacher {
    pub name: String,
    pub phone_number: Option<String>,
    pub joining_date: NaiveDate,
    pub status: TeacherStatus,
}

impl Teacher {
    pub fn draft(&self) -> NewTeacher {
        NewTeacher {
            name: self.name.clone(),
            phone_number: Some(self.phone_number.clone()),
            joining_date: self.joining_date,
            status: self.status,
        }
    }
}

// ---------------------------------------------------------------------------
// Fee record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeeRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    /// 1-based month.
    pub month: u32,
    pub year: i32,
    pub amount: f64,
    pub status: FeeStatus,
    /// Set whenever `status` is not `Unpaid`.
    pub paid_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewFeeRecord {
    pub student_id: Uuid,
    pub month: u32,
    pub year: i32,
    pub amount: f64,
    pub status: FeeStatus,
}

// ---------------------------------------------------------------------------
// Class schedule
// ---------------------------------------------------------------------------

/// One timetable slot. `(class, day_of_week, start_time)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassSchedule {
    pub id: Uuid,
    pub class: ClassLevel,
    /// 0 = Sunday ... 6 = Saturday.
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub subject: String,
    pub teacher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewSchedule {
    pub class: ClassLevel,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub subject: String,
    pub teacher_id: Option<Uuid>,
}

impl ClassSchedule {
    pub fn draft(&self) -> NewSchedule {
        NewSchedule {
            class: self.class,
            day_of_week: self.day_of_week,
            start_time: self.start_time,
            end_time: self.end_time,
            subject: self.subject.clone(),
            teacher_id: self.teacher_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Promotion snapshot
// ---------------------------------------------------------------------------

/// Point-in-time copy of the whole student collection, written before every
/// promotion run and consumed by undo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromotionSnapshot {
    pub id: Uuid,
    pub promoted_by: Option<UserId>,
    pub previous_state: Vec<Student>,
    pub promoted_at: DateTime<Utc>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
