use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use campus_shared::{NewTeacher, Teacher};
use campus_store::{Collection, Row};

use crate::engine::{encode, SyncEngine};
use crate::error::Result;
use crate::validator::validate_teacher;

impl SyncEngine {
    pub async fn add_teacher(&self, teacher: NewTeacher) -> Result<Uuid> {
        let outcome = self.insert_teacher(teacher).await;
        self.report(outcome, "Teacher added successfully", "Failed to add teacher")
    }

    pub async fn update_teacher(&self, teacher: &Teacher) -> Result<()> {
        let outcome = self.write_teacher(teacher).await;
        self.report(
            outcome,
            "Teacher updated successfully",
            "Failed to update teacher",
        )
    }

    pub async fn delete_teacher(&self, id: Uuid) -> Result<()> {
        let outcome = self.remove_teacher(id).await;
        self.report(
            outcome,
            "Teacher deleted successfully",
            "Failed to delete teacher",
        )
    }

    async fn insert_teacher(&self, teacher: NewTeacher) -> Result<Uuid> {
        validate_teacher(&teacher)?;

        let id = Uuid::new_v4();
        let mut row = teacher_row(&teacher)?;
        row.insert("id".into(), Value::String(id.to_string()));

        self.store.insert(Collection::Teachers, row).await?;

        info!(teacher_id = %id, name = %teacher.name, "Teacher added");
        self.refresh(Collection::Teachers).await;
        Ok(id)
    }

    async fn write_teacher(&self, teacher: &Teacher) -> Result<()> {
        let draft = teacher.draft();
        validate_teacher(&draft)?;

        self.store
            .update(Collection::Teachers, teacher.id, teacher_row(&draft)?)
            .await?;

        info!(teacher_id = %teacher.id, "Teacher updated");
        self.refresh(Collection::Teachers).await;
        Ok(())
    }

    async fn remove_teacher(&self, id: Uuid) -> Result<()> {
        if self.store.delete(Collection::Teachers, id).await? {
            info!(teacher_id = %id, "Teacher deleted");
        } else {
            debug!(teacher_id = %id, "Teacher already absent");
        }
        self.refresh(Collection::Teachers).await;
        Ok(())
    }
}

/// The phone number column is never null.
fn teacher_row(teacher: &NewTeacher) -> Result<Row> {
    let mut row = encode(teacher)?;
    row.insert(
        "phone_number".into(),
        Value::String(teacher.phone_number.clone().unwrap_or_default()),
    );
    Ok(row)
}
