//! Class promotion and single-level undo.
//!
//! Neither operation is atomic. Each student is an independent store write;
//! a failure stops the loop and leaves earlier writes committed. The
//! snapshot written before a promotion is the only compensating record, and
//! undo consumes it even when its own loop fails partway.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use campus_shared::{ClassLevel, PromotionSnapshot, Student, StudentStatus};
use campus_store::{format_timestamp, Collection, Query, Row, StoreError};

use crate::engine::{decode_row, encode, SyncEngine};
use crate::error::{Result, SyncError};

/// The three student columns promotion and undo rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionPatch {
    pub class: ClassLevel,
    pub status: StudentStatus,
    pub academic_year: i32,
}

impl PromotionPatch {
    /// Placement in `next_year` for an active student. At the top of the
    /// progression the class stays and the student passes out.
    pub fn advance(student: &Student, next_year: i32) -> Self {
        match student.class.next() {
            Some(next) => Self {
                class: next,
                status: StudentStatus::Active,
                academic_year: next_year,
            },
            None => Self {
                class: student.class,
                status: StudentStatus::PassOut,
                academic_year: next_year,
            },
        }
    }

    /// The captured placement of a snapshot entry.
    pub fn restore(student: &Student) -> Self {
        Self {
            class: student.class,
            status: student.status,
            academic_year: student.academic_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionReport {
    pub snapshot_id: Uuid,
    /// Students moved up one class.
    pub promoted: usize,
    /// Students at the final class marked as passed out.
    pub passed_out: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoReport {
    pub snapshot_id: Uuid,
    pub restored: usize,
    /// Snapshot entries whose student no longer exists.
    pub skipped: usize,
}

impl SyncEngine {
    /// Advance every active student one class, recording a snapshot first.
    ///
    /// Running this twice without an undo in between advances students
    /// twice; nothing guards against a repeat within the same year.
    pub async fn promote_all_classes(&self) -> Result<PromotionReport> {
        let outcome = self.run_promotion().await;
        self.report(
            outcome,
            "All classes promoted successfully",
            "Failed to promote classes",
        )
    }

    /// Restore the placements captured by the most recent promotion.
    pub async fn undo_promotion(&self) -> Result<UndoReport> {
        let outcome = self.run_undo().await;
        self.report(
            outcome,
            "Last promotion undone successfully",
            "Failed to undo promotion",
        )
    }

    async fn run_promotion(&self) -> Result<PromotionReport> {
        let (students, selected_year, identity) = {
            let state = self.read_state();
            (
                state.students.clone(),
                state.selected_year,
                state.identity.clone(),
            )
        };

        let next_year = selected_year
            .checked_add(1)
            .ok_or_else(|| SyncError::InvalidField {
                field: "academic_year",
                reason: format!("{selected_year} has no following year"),
            })?;

        let plan = students
            .iter()
            .filter(|s| s.is_active())
            .map(|s| -> Result<(Uuid, Row, bool)> {
                let patch = PromotionPatch::advance(s, next_year);
                let passes_out = patch.status == StudentStatus::PassOut;
                Ok((s.id, encode(&patch)?, passes_out))
            })
            .collect::<Result<Vec<(Uuid, Row, bool)>>>()?;

        let snapshot = PromotionSnapshot {
            id: Uuid::new_v4(),
            promoted_by: identity,
            previous_state: students,
            promoted_at: Utc::now(),
        };
        let mut row = encode(&snapshot)?;
        // Fixed-width text so that newest-first ordering is chronological.
        row.insert(
            "promoted_at".into(),
            Value::String(format_timestamp(snapshot.promoted_at)),
        );
        self.store
            .insert(Collection::PromotionHistory, row)
            .await
            .map_err(SyncError::SnapshotFailed)?;

        info!(
            snapshot_id = %snapshot.id,
            students = snapshot.previous_state.len(),
            active = plan.len(),
            selected_year,
            "Promotion snapshot recorded"
        );

        let total = plan.len();
        let mut report = PromotionReport {
            snapshot_id: snapshot.id,
            promoted: 0,
            passed_out: 0,
        };
        let mut outcome = Ok(());

        for (applied, (id, patch, passes_out)) in plan.into_iter().enumerate() {
            if let Err(source) = self.store.update(Collection::Students, id, patch).await {
                error!(student_id = %id, applied, total, error = %source, "Promotion write failed");
                outcome = Err(SyncError::PartialPromotion {
                    applied,
                    total,
                    source,
                });
                break;
            }
            if passes_out {
                report.passed_out += 1;
            } else {
                report.promoted += 1;
            }
        }

        self.refresh(Collection::Students).await;
        self.refresh(Collection::PromotionHistory).await;

        outcome?;
        info!(
            promoted = report.promoted,
            passed_out = report.passed_out,
            "Promotion complete"
        );
        Ok(report)
    }

    async fn run_undo(&self) -> Result<UndoReport> {
        let latest = Query::new().order_desc("promoted_at").limit(1);
        let row = match self
            .store
            .query_one(Collection::PromotionHistory, latest)
            .await
        {
            Ok(row) => row,
            Err(StoreError::NotFound) => return Err(SyncError::NothingToUndo),
            Err(e) => return Err(e.into()),
        };
        let snapshot: PromotionSnapshot = decode_row(Collection::PromotionHistory, row)?;

        let plan = snapshot
            .previous_state
            .iter()
            .map(|s| -> Result<(Uuid, Row)> { Ok((s.id, encode(&PromotionPatch::restore(s))?)) })
            .collect::<Result<Vec<(Uuid, Row)>>>()?;

        let total = plan.len();
        let mut report = UndoReport {
            snapshot_id: snapshot.id,
            restored: 0,
            skipped: 0,
        };
        let mut outcome = Ok(());

        for (applied, (id, patch)) in plan.into_iter().enumerate() {
            match self.store.update(Collection::Students, id, patch).await {
                Ok(()) => report.restored += 1,
                Err(StoreError::NotFound) => {
                    warn!(student_id = %id, "Snapshot student no longer exists, skipping");
                    report.skipped += 1;
                }
                Err(source) => {
                    error!(student_id = %id, applied, total, error = %source, "Undo write failed");
                    outcome = Err(SyncError::PartialUndo {
                        applied,
                        total,
                        source,
                    });
                    break;
                }
            }
        }

        // The snapshot is spent once any write was attempted.
        if let Err(e) = self
            .store
            .delete(Collection::PromotionHistory, snapshot.id)
            .await
        {
            error!(snapshot_id = %snapshot.id, error = %e, "Could not delete consumed snapshot");
            if outcome.is_ok() {
                outcome = Err(e.into());
            }
        }

        self.refresh(Collection::Students).await;
        self.refresh(Collection::PromotionHistory).await;

        outcome?;
        info!(
            snapshot_id = %snapshot.id,
            restored = report.restored,
            skipped = report.skipped,
            "Promotion undone"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use campus_shared::UserId;
    use campus_store::{Database, RecordStore};

    use super::*;
    use crate::testing::{engine_on, new_student, FaultyStore, YEAR};

    type Placement = (ClassLevel, StudentStatus, i32);

    fn placements(engine: &SyncEngine) -> Vec<(Uuid, Placement)> {
        let mut all: Vec<_> = engine
            .students()
            .into_iter()
            .map(|s| (s.id, (s.class, s.status, s.academic_year)))
            .collect();
        all.sort_by_key(|(id, _)| *id);
        all
    }

    fn placement(engine: &SyncEngine, id: Uuid) -> Placement {
        let s = engine.get_student_by_id(id).unwrap();
        (s.class, s.status, s.academic_year)
    }

    async fn seeded(store: Arc<dyn RecordStore>) -> (SyncEngine, Uuid, Uuid, Uuid) {
        let engine = engine_on(store);
        let junior = engine
            .add_student(new_student("R-1", ClassLevel::Class1))
            .await
            .unwrap();
        let senior = engine
            .add_student(new_student("R-2", ClassLevel::last()))
            .await
            .unwrap();
        let mut alumnus = new_student("R-3", ClassLevel::Class7);
        alumnus.status = StudentStatus::PassOut;
        alumnus.academic_year = 2019;
        let alumnus = engine.add_student(alumnus).await.unwrap();
        (engine, junior, senior, alumnus)
    }

    #[test]
    fn advance_moves_up_or_passes_out() {
        let (engine_year, next_year) = (YEAR, YEAR + 1);
        let student = |class| Student {
            id: Uuid::new_v4(),
            registration_id: "x".into(),
            name: "x".into(),
            father_name: String::new(),
            phone_number: String::new(),
            class,
            status: StudentStatus::Active,
            joining_date: chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            academic_year: engine_year,
            created_at: Utc::now(),
        };

        assert_eq!(
            PromotionPatch::advance(&student(ClassLevel::Kg2), next_year),
            PromotionPatch {
                class: ClassLevel::Class1,
                status: StudentStatus::Active,
                academic_year: next_year,
            }
        );
        assert_eq!(
            PromotionPatch::advance(&student(ClassLevel::Class10), next_year),
            PromotionPatch {
                class: ClassLevel::Class10,
                status: StudentStatus::PassOut,
                academic_year: next_year,
            }
        );
    }

    #[tokio::test]
    async fn promotion_advances_active_students_only() {
        let (engine, junior, senior, alumnus) =
            seeded(Arc::new(Database::open_in_memory().unwrap())).await;

        let report = engine.promote_all_classes().await.unwrap();
        assert_eq!(report.promoted, 1);
        assert_eq!(report.passed_out, 1);

        assert_eq!(
            placement(&engine, junior),
            (ClassLevel::Class2, StudentStatus::Active, 2025)
        );
        assert_eq!(
            placement(&engine, senior),
            (ClassLevel::Class10, StudentStatus::PassOut, 2025)
        );
        assert_eq!(
            placement(&engine, alumnus),
            (ClassLevel::Class7, StudentStatus::PassOut, 2019)
        );
        assert_eq!(engine.promotion_history().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_captures_whole_collection_and_identity() {
        let (engine, ..) = seeded(Arc::new(Database::open_in_memory().unwrap())).await;
        engine.set_identity(Some(UserId::new("principal")));
        let before = engine.students();

        engine.promote_all_classes().await.unwrap();

        let snapshot = &engine.promotion_history()[0];
        assert_eq!(snapshot.promoted_by, Some(UserId::new("principal")));
        assert_eq!(snapshot.previous_state, before);
    }

    #[tokio::test]
    async fn promote_then_undo_is_identity() {
        let (engine, ..) = seeded(Arc::new(Database::open_in_memory().unwrap())).await;
        let before = placements(&engine);

        engine.promote_all_classes().await.unwrap();
        assert_ne!(placements(&engine), before);

        let report = engine.undo_promotion().await.unwrap();
        assert_eq!(report.restored, 3);
        assert_eq!(report.skipped, 0);
        assert_eq!(placements(&engine), before);
        assert!(engine.promotion_history().is_empty());
    }

    #[tokio::test]
    async fn repeated_promotion_advances_twice() {
        // No guard against a second run in the same academic year.
        let (engine, junior, ..) = seeded(Arc::new(Database::open_in_memory().unwrap())).await;

        engine.promote_all_classes().await.unwrap();
        engine.promote_all_classes().await.unwrap();

        assert_eq!(
            placement(&engine, junior),
            (ClassLevel::Class3, StudentStatus::Active, 2025)
        );
        assert_eq!(engine.promotion_history().len(), 2);
    }

    #[tokio::test]
    async fn undo_consults_only_the_newest_snapshot() {
        let (engine, junior, ..) = seeded(Arc::new(Database::open_in_memory().unwrap())).await;

        engine.promote_all_classes().await.unwrap();
        engine.promote_all_classes().await.unwrap();

        engine.undo_promotion().await.unwrap();
        assert_eq!(placement(&engine, junior).0, ClassLevel::Class2);
        assert_eq!(engine.promotion_history().len(), 1);

        engine.undo_promotion().await.unwrap();
        assert_eq!(placement(&engine, junior).0, ClassLevel::Class1);
    }

    #[tokio::test]
    async fn undo_without_history_writes_nothing() {
        let store = Arc::new(FaultyStore::new());
        let engine = engine_on(store.clone());
        store.fail_update_at(None);

        let err = engine.undo_promotion().await.unwrap_err();
        assert!(matches!(err, SyncError::NothingToUndo));
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn failed_snapshot_aborts_before_any_student_write() {
        let store = Arc::new(FaultyStore::new());
        let (engine, ..) = seeded(store.clone()).await;
        let before = placements(&engine);

        store.fail_update_at(None);
        store.fail_inserts_into(Some(Collection::PromotionHistory));

        let err = engine.promote_all_classes().await.unwrap_err();
        assert!(matches!(err, SyncError::SnapshotFailed(_)));
        assert_eq!(store.update_calls(), 0);
        assert_eq!(placements(&engine), before);
    }

    #[tokio::test]
    async fn partial_promotion_keeps_earlier_writes() {
        let store = Arc::new(FaultyStore::new());
        let engine = engine_on(store.clone());
        let mut ids = Vec::new();
        for (i, class) in [ClassLevel::Class1, ClassLevel::Class2, ClassLevel::Class3]
            .into_iter()
            .enumerate()
        {
            ids.push(
                engine
                    .add_student(new_student(&format!("R-{i}"), class))
                    .await
                    .unwrap(),
            );
        }
        // Iteration order is the mirror's newest-first order.
        let order: Vec<Uuid> = engine.students().iter().map(|s| s.id).collect();
        let before: Vec<Placement> = order.iter().map(|id| placement(&engine, *id)).collect();

        store.fail_update_at(Some(1));
        let err = engine.promote_all_classes().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::PartialPromotion { applied: 1, total: 3, .. }
        ));
        assert_eq!(store.update_calls(), 2, "writes after the failure are not attempted");

        let first = placement(&engine, order[0]);
        assert_eq!(first.0, before[0].0.next().unwrap());
        assert_eq!(placement(&engine, order[1]), before[1]);
        assert_eq!(placement(&engine, order[2]), before[2]);

        // Manual undo reconciles the partial state.
        store.fail_update_at(None);
        engine.undo_promotion().await.unwrap();
        let after: Vec<Placement> = order.iter().map(|id| placement(&engine, *id)).collect();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn partial_undo_still_consumes_the_snapshot() {
        let store = Arc::new(FaultyStore::new());
        let (engine, ..) = seeded(store.clone()).await;
        engine.promote_all_classes().await.unwrap();

        store.fail_update_at(Some(0));
        let err = engine.undo_promotion().await.unwrap_err();
        assert!(matches!(err, SyncError::PartialUndo { applied: 0, .. }));
        assert!(engine.promotion_history().is_empty());

        store.fail_update_at(None);
        let err = engine.undo_promotion().await.unwrap_err();
        assert!(matches!(err, SyncError::NothingToUndo));
    }

    #[tokio::test]
    async fn undo_skips_students_deleted_since_promotion() {
        let (engine, junior, senior, _) =
            seeded(Arc::new(Database::open_in_memory().unwrap())).await;
        engine.promote_all_classes().await.unwrap();
        engine.delete_student(senior).await.unwrap();

        let report = engine.undo_promotion().await.unwrap();
        assert_eq!(report.restored, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            placement(&engine, junior),
            (ClassLevel::Class1, StudentStatus::Active, YEAR)
        );
        assert!(engine.get_student_by_id(senior).is_none());
    }

    #[tokio::test]
    async fn promotion_uses_selected_year() {
        let (engine, junior, ..) = seeded(Arc::new(Database::open_in_memory().unwrap())).await;
        engine.set_selected_year(2030);
        engine.promote_all_classes().await.unwrap();
        assert_eq!(placement(&engine, junior).2, 2031);
    }

    #[tokio::test]
    async fn last_representable_year_is_rejected_before_any_write() {
        let store = Arc::new(FaultyStore::new());
        let (engine, ..) = seeded(store.clone()).await;
        let before = placements(&engine);
        let mut notices = engine.notices();

        store.fail_update_at(None);
        engine.set_selected_year(i32::MAX);
        let err = engine.promote_all_classes().await.unwrap_err();

        assert!(matches!(
            err,
            SyncError::InvalidField { field: "academic_year", .. }
        ));
        assert_eq!(store.update_calls(), 0);
        assert!(engine.promotion_history().is_empty());
        assert_eq!(placements(&engine), before);

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, crate::events::NoticeLevel::Error);
        assert_eq!(notice.message, err.to_string());
    }
}
