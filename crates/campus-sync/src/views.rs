//! Read-only projections over the mirrored collections.
//!
//! Every view recomputes from the current state and returns owned copies.

use uuid::Uuid;

use campus_shared::{
    ClassLevel, ClassSchedule, FeeRecord, PromotionSnapshot, Student, StudentStatus, Teacher,
};

use crate::engine::SyncEngine;
use crate::state::SyncState;

impl SyncEngine {
    pub fn students(&self) -> Vec<Student> {
        self.read_state().students.clone()
    }

    pub fn teachers(&self) -> Vec<Teacher> {
        self.read_state().teachers.clone()
    }

    pub fn fee_records(&self) -> Vec<FeeRecord> {
        self.read_state().fee_records.clone()
    }

    pub fn schedules(&self) -> Vec<ClassSchedule> {
        self.read_state().schedules.clone()
    }

    pub fn promotion_history(&self) -> Vec<PromotionSnapshot> {
        self.read_state().promotion_history.clone()
    }

    pub fn get_students_by_class(&self, class: ClassLevel) -> Vec<Student> {
        students_by_class(&self.read_state(), class)
    }

    pub fn get_passed_out_students(&self) -> Vec<Student> {
        passed_out_students(&self.read_state())
    }

    pub fn get_student_by_id(&self, id: Uuid) -> Option<Student> {
        student_by_id(&self.read_state(), id)
    }

    pub fn get_teacher_by_id(&self, id: Uuid) -> Option<Teacher> {
        teacher_by_id(&self.read_state(), id)
    }

    pub fn get_fee_records_by_student(&self, student_id: Uuid, year: i32) -> Vec<FeeRecord> {
        fee_records_by_student(&self.read_state(), student_id, year)
    }

    pub fn get_fee_records_by_month(&self, month: u32, year: i32) -> Vec<FeeRecord> {
        fee_records_by_month(&self.read_state(), month, year)
    }

    /// The first slot of `class` in mirror order.
    pub fn get_schedule_by_class(&self, class: ClassLevel) -> Option<ClassSchedule> {
        schedule_by_class(&self.read_state(), class)
    }

    /// Every slot of `class`, by day then start time.
    pub fn get_schedules_by_class(&self, class: ClassLevel) -> Vec<ClassSchedule> {
        schedules_by_class(&self.read_state(), class)
    }
}

pub fn students_by_class(state: &SyncState, class: ClassLevel) -> Vec<Student> {
    state
        .students()
        .iter()
        .filter(|s| s.class == class)
        .cloned()
        .collect()
}

pub fn passed_out_students(state: &SyncState) -> Vec<Student> {
    state
        .students()
        .iter()
        .filter(|s| s.status == StudentStatus::PassOut)
        .cloned()
        .collect()
}

pub fn student_by_id(state: &SyncState, id: Uuid) -> Option<Student> {
    state.students().iter().find(|s| s.id == id).cloned()
}

pub fn teacher_by_id(state: &SyncState, id: Uuid) -> Option<Teacher> {
    state.teachers().iter().find(|t| t.id == id).cloned()
}

pub fn fee_records_by_student(state: &SyncState, student_id: Uuid, year: i32) -> Vec<FeeRecord> {
    state
        .fee_records()
        .iter()
        .filter(|r| r.student_id == student_id && r.year == year)
        .cloned()
        .collect()
}

pub fn fee_records_by_month(state: &SyncState, month: u32, year: i32) -> Vec<FeeRecord> {
    state
        .fee_records()
        .iter()
        .filter(|r| r.month == month && r.year == year)
        .cloned()
        .collect()
}

pub fn schedule_by_class(state: &SyncState, class: ClassLevel) -> Option<ClassSchedule> {
    state.schedules().iter().find(|s| s.class == class).cloned()
}

pub fn schedules_by_class(state: &SyncState, class: ClassLevel) -> Vec<ClassSchedule> {
    let mut slots: Vec<ClassSchedule> = state
        .schedules()
        .iter()
        .filter(|s| s.class == class)
        .cloned()
        .collect();
    slots.sort_by_key(|s| (s.day_of_week, s.start_time));
    slots
}
