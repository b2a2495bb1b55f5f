//! Pre-write checks: registration identifier uniqueness and required fields.

use uuid::Uuid;

use campus_shared::constants::{MAX_DAY_OF_WEEK, MONTHS_PER_YEAR};
use campus_shared::{NewFeeRecord, NewSchedule, NewStudent, NewTeacher};
use campus_store::{Collection, Query, StoreError};

use crate::engine::SyncEngine;
use crate::error::{Result, SyncError};

impl SyncEngine {
    /// Whether another student already holds `registration_id`.
    ///
    /// `exclude_id` is the student being edited, which may keep its own
    /// identifier. Only the store's "no matching row" answer counts as
    /// available; any other failure is returned as
    /// [`SyncError::AvailabilityUnknown`].
    pub async fn check_registration_id(
        &self,
        registration_id: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool> {
        let mut query = Query::new().eq("registration_id", registration_id);
        if let Some(id) = exclude_id {
            query = query.neq("id", id.to_string());
        }

        match self.store.query_one(Collection::Students, query).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(SyncError::AvailabilityUnknown(e)),
        }
    }

    pub(crate) async fn ensure_registration_available(
        &self,
        registration_id: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<()> {
        if self
            .check_registration_id(registration_id, exclude_id)
            .await?
        {
            return Err(SyncError::DuplicateRegistrationId(
                registration_id.to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_student(student: &NewStudent) -> Result<()> {
    require("registration_id", &student.registration_id)?;
    require("name", &student.name)
}

pub(crate) fn validate_teacher(teacher: &NewTeacher) -> Result<()> {
    require("name", &teacher.name)
}

pub(crate) fn validate_fee(month: u32, amount: f64) -> Result<()> {
    if !(1..=MONTHS_PER_YEAR).contains(&month) {
        return Err(SyncError::InvalidField {
            field: "month",
            reason: format!("{month} is not between 1 and {MONTHS_PER_YEAR}"),
        });
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err(SyncError::InvalidField {
            field: "amount",
            reason: format!("{amount} must be a non-negative number"),
        });
    }
    Ok(())
}

pub(crate) fn validate_fee_record(record: &NewFeeRecord) -> Result<()> {
    validate_fee(record.month, record.amount)
}

pub(crate) fn validate_schedule(schedule: &NewSchedule) -> Result<()> {
    if schedule.day_of_week > MAX_DAY_OF_WEEK {
        return Err(SyncError::InvalidField {
            field: "day_of_week",
            reason: format!("{} is not between 0 and {MAX_DAY_OF_WEEK}", schedule.day_of_week),
        });
    }
    if schedule.end_time <= schedule.start_time {
        return Err(SyncError::InvalidField {
            field: "end_time",
            reason: format!(
                "{} is not after {}",
                schedule.end_time, schedule.start_time
            ),
        });
    }
    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::MissingField(field));
    }
    Ok(())
}
