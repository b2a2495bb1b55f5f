use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use campus_shared::{ClassSchedule, NewSchedule};
use campus_store::{Collection, StoreError};

use crate::engine::{encode, SyncEngine};
use crate::error::{Result, SyncError};
use crate::validator::validate_schedule;

impl SyncEngine {
    pub async fn add_schedule(&self, schedule: NewSchedule) -> Result<Uuid> {
        let outcome = self.insert_schedule(schedule).await;
        self.report(outcome, "Schedule added successfully", "Failed to add schedule")
    }

    pub async fn update_schedule(&self, schedule: &ClassSchedule) -> Result<()> {
        let outcome = self.write_schedule(schedule).await;
        self.report(
            outcome,
            "Schedule updated successfully",
            "Failed to update schedule",
        )
    }

    pub async fn delete_schedule(&self, id: Uuid) -> Result<()> {
        let outcome = self.remove_schedule(id).await;
        self.report(
            outcome,
            "Schedule deleted successfully",
            "Failed to delete schedule",
        )
    }

    async fn insert_schedule(&self, schedule: NewSchedule) -> Result<Uuid> {
        validate_schedule(&schedule)?;

        let id = Uuid::new_v4();
        let mut row = encode(&schedule)?;
        row.insert("id".into(), Value::String(id.to_string()));

        self.store
            .insert(Collection::ClassSchedules, row)
            .await
            .map_err(|e| slot_conflict(&schedule, e))?;

        info!(schedule_id = %id, class = %schedule.class, day = schedule.day_of_week, start = %schedule.start_time, "Schedule added");
        self.refresh(Collection::ClassSchedules).await;
        Ok(id)
    }

    async fn write_schedule(&self, schedule: &ClassSchedule) -> Result<()> {
        let draft = schedule.draft();
        validate_schedule(&draft)?;

        self.store
            .update(Collection::ClassSchedules, schedule.id, encode(&draft)?)
            .await
            .map_err(|e| slot_conflict(&draft, e))?;

        info!(schedule_id = %schedule.id, "Schedule updated");
        self.refresh(Collection::ClassSchedules).await;
        Ok(())
    }

    async fn remove_schedule(&self, id: Uuid) -> Result<()> {
        if self.store.delete(Collection::ClassSchedules, id).await? {
            info!(schedule_id = %id, "Schedule deleted");
        } else {
            debug!(schedule_id = %id, "Schedule already absent");
        }
        self.refresh(Collection::ClassSchedules).await;
        Ok(())
    }
}

/// Schedule conflict guard: the store's uniqueness signal on a schedule
/// write means the `(class, day_of_week, start_time)` slot is taken. Every
/// other error passes through untouched.
pub fn slot_conflict(schedule: &NewSchedule, err: StoreError) -> SyncError {
    if err.is_unique_violation() {
        SyncError::ScheduleSlotTaken {
            class: schedule.class,
            day_of_week: schedule.day_of_week,
            start_time: schedule.start_time,
        }
    } else {
        SyncError::Store(err)
    }
}
