use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use campus_shared::{NewStudent, Student};
use campus_store::{Collection, StoreError};

use crate::engine::{encode, SyncEngine};
use crate::error::{Result, SyncError};
use crate::validator::validate_student;

impl SyncEngine {
    /// Register a new student and return the assigned id.
    pub async fn add_student(&self, student: NewStudent) -> Result<Uuid> {
        let outcome = self.insert_student(student).await;
        self.report(outcome, "Student added successfully", "Failed to add student")
    }

    /// Overwrite every writable field of an existing student.
    pub async fn update_student(&self, student: &Student) -> Result<()> {
        let outcome = self.write_student(student).await;
        self.report(
            outcome,
            "Student updated successfully",
            "Failed to update student",
        )
    }

    pub async fn delete_student(&self, id: Uuid) -> Result<()> {
        let outcome = self.remove_student(id).await;
        self.report(
            outcome,
            "Student deleted successfully",
            "Failed to delete student",
        )
    }

    async fn insert_student(&self, student: NewStudent) -> Result<Uuid> {
        validate_student(&student)?;
        self.ensure_registration_available(&student.registration_id, None)
            .await?;

        let id = Uuid::new_v4();
        let mut row = encode(&student)?;
        row.insert("id".into(), Value::String(id.to_string()));

        self.store
            .insert(Collection::Students, row)
            .await
            .map_err(|e| registration_conflict(&student.registration_id, e))?;

        info!(student_id = %id, registration_id = %student.registration_id, "Student added");
        self.refresh(Collection::Students).await;
        Ok(id)
    }

    async fn write_student(&self, student: &Student) -> Result<()> {
        let draft = student.draft();
        validate_student(&draft)?;
        self.ensure_registration_available(&draft.registration_id, Some(student.id))
            .await?;

        self.store
            .update(Collection::Students, student.id, encode(&draft)?)
            .await
            .map_err(|e| registration_conflict(&draft.registration_id, e))?;

        info!(student_id = %student.id, "Student updated");
        self.refresh(Collection::Students).await;
        Ok(())
    }

    async fn remove_student(&self, id: Uuid) -> Result<()> {
        if self.store.delete(Collection::Students, id).await? {
            info!(student_id = %id, "Student deleted");
        } else {
            debug!(student_id = %id, "Student already absent");
        }
        self.refresh(Collection::Students).await;
        Ok(())
    }
}

/// A write that passed the pre-check but lost a race on the store's own
/// uniqueness constraint is still a duplicate.
fn registration_conflict(registration_id: &str, err: StoreError) -> SyncError {
    if err.is_unique_violation() {
        SyncError::DuplicateRegistrationId(registration_id.to_string())
    } else {
        SyncError::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use campus_shared::{ClassLevel, StudentStatus};
    use campus_store::Database;

    use super::*;
    use crate::events::NoticeLevel;
    use crate::testing::{engine_on, new_student};

    fn engine() -> SyncEngine {
        engine_on(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn added_student_is_mirrored_field_for_field() {
        let engine = engine();
        let draft = new_student("R-100", ClassLevel::Class3);

        let id = engine.add_student(draft.clone()).await.unwrap();
        let stored = engine.get_student_by_id(id).unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.draft(), draft);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected_without_mutation() {
        let engine = engine();
        engine
            .add_student(new_student("R-1", ClassLevel::Class1))
            .await
            .unwrap();
        let before = engine.students();

        let err = engine
            .add_student(new_student("R-1", ClassLevel::Class2))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::DuplicateRegistrationId(ref r) if r == "R-1"));
        assert_eq!(engine.students(), before);
    }

    #[tokio::test]
    async fn update_may_keep_own_registration_but_not_take_anothers() {
        let engine = engine();
        let first = engine
            .add_student(new_student("R-1", ClassLevel::Class1))
            .await
            .unwrap();
        let second = engine
            .add_student(new_student("R-2", ClassLevel::Class1))
            .await
            .unwrap();

        let mut edited = engine.get_student_by_id(first).unwrap();
        edited.name = "Renamed".into();
        engine.update_student(&edited).await.unwrap();
        assert_eq!(engine.get_student_by_id(first).unwrap().name, "Renamed");

        let mut clash = engine.get_student_by_id(second).unwrap();
        clash.registration_id = "R-1".into();
        let before = engine.students();
        let err = engine.update_student(&clash).await.unwrap_err();
        assert!(matches!(err, SyncError::DuplicateRegistrationId(_)));
        assert_eq!(engine.students(), before);
    }

    #[tokio::test]
    async fn missing_name_is_rejected_before_any_write() {
        let engine = engine();
        let mut draft = new_student("R-9", ClassLevel::Nursery);
        draft.name = "   ".into();

        let err = engine.add_student(draft).await.unwrap_err();
        assert!(matches!(err, SyncError::MissingField("name")));
        assert!(engine.students().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_from_mirror() {
        let engine = engine();
        let id = engine
            .add_student(new_student("R-5", ClassLevel::Kg1))
            .await
            .unwrap();
        engine.delete_student(id).await.unwrap();
        assert!(engine.get_student_by_id(id).is_none());

        // Deleting again is not an error.
        engine.delete_student(id).await.unwrap();
    }

    #[tokio::test]
    async fn every_outcome_emits_a_notice() {
        let engine = engine();
        let mut notices = engine.notices();

        engine
            .add_student(new_student("R-1", ClassLevel::Class1))
            .await
            .unwrap();
        let ok = notices.recv().await.unwrap();
        assert_eq!(ok.level, NoticeLevel::Success);
        assert_eq!(ok.message, "Student added successfully");

        let _ = engine
            .add_student(new_student("R-1", ClassLevel::Class1))
            .await;
        let failed = notices.recv().await.unwrap();
        assert_eq!(failed.level, NoticeLevel::Error);
        assert!(failed.message.starts_with("Registration ID already exists"));
    }

    #[tokio::test]
    async fn pass_out_students_can_be_registered() {
        let engine = engine();
        let mut draft = new_student("R-77", ClassLevel::Class10);
        draft.status = StudentStatus::PassOut;
        let id = engine.add_student(draft).await.unwrap();
        assert_eq!(engine.get_passed_out_students()[0].id, id);
    }
}
