//! Collection addressing and per-table column layouts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// A remote table mirrored by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Students,
    Teachers,
    FeeRecords,
    ClassSchedules,
    PromotionHistory,
}

impl Collection {
    /// The four collections kept live through change notifications.
    pub const SUBSCRIBED: [Collection; 4] = [
        Collection::Students,
        Collection::Teachers,
        Collection::FeeRecords,
        Collection::ClassSchedules,
    ];

    pub fn table_name(self) -> &'static str {
        self.spec().table
    }

    pub fn spec(self) -> &'static TableSpec {
        match self {
            Collection::Students => &STUDENTS,
            Collection::Teachers => &TEACHERS,
            Collection::FeeRecords => &FEE_RECORDS,
            Collection::ClassSchedules => &CLASS_SCHEDULES,
            Collection::PromotionHistory => &PROMOTION_HISTORY,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// How a column's JSON value is stored in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    /// Arbitrary JSON, stored as text.
    Json,
}

#[derive(Debug)]
pub struct TableSpec {
    pub collection: Collection,
    pub table: &'static str,
    pub columns: &'static [(&'static str, ColumnKind)],
    /// Column used for the default newest-first ordering.
    pub order_column: &'static str,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Result<ColumnKind> {
        self.columns
            .iter()
            .find(|(col, _)| *col == name)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| StoreError::UnknownColumn {
                collection: self.collection,
                column: name.to_string(),
            })
    }

    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|(col, _)| *col)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

use ColumnKind::{Integer, Json, Real, Text};

static STUDENTS: TableSpec = TableSpec {
    collection: Collection::Students,
    table: "students",
    columns: &[
        ("id", Text),
        ("registration_id", Text),
        ("name", Text),
        ("father_name", Text),
        ("phone_number", Text),
        ("class", Text),
        ("status", Text),
        ("joining_date", Text),
        ("academic_year", Integer),
        ("created_at", Text),
    ],
    order_column: "created_at",
};

static TEACHERS: TableSpec = TableSpec {
    collection: Collection::Teachers,
    table: "teachers",
    columns: &[
        ("id", Text),
        ("name", Text),
        ("phone_number", Text),
        ("joining_date", Text),
        ("status", Text),
        ("created_at", Text),
    ],
    order_column: "created_at",
};

static FEE_RECORDS: TableSpec = TableSpec {
    collection: Collection::FeeRecords,
    table: "fee_records",
    columns: &[
        ("id", Text),
        ("student_id", Text),
        ("month", Integer),
        ("year", Integer),
        ("amount", Real),
        ("status", Text),
        ("paid_date", Text),
        ("created_at", Text),
        ("updated_at", Text),
    ],
    order_column: "created_at",
};

static CLASS_SCHEDULES: TableSpec = TableSpec {
    collection: Collection::ClassSchedules,
    table: "class_schedules",
    columns: &[
        ("id", Text),
        ("class", Text),
        ("day_of_week", Integer),
        ("start_time", Text),
        ("end_time", Text),
        ("subject", Text),
        ("teacher_id", Text),
        ("created_at", Text),
    ],
    order_column: "created_at",
};

static PROMOTION_HISTORY: TableSpec = TableSpec {
    collection: Collection::PromotionHistory,
    table: "promotion_history",
    columns: &[
        ("id", Text),
        ("promoted_by", Text),
        ("previous_state", Json),
        ("promoted_at", Text),
        ("created_at", Text),
    ],
    order_column: "promoted_at",
};
