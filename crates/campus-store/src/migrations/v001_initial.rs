//! v001 -- Initial schema creation.
//!
//! Creates the five mirrored tables: `students`, `teachers`, `fee_records`,
//! `class_schedules`, and `promotion_history`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Students
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS students (
    id              TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    registration_id TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    father_name     TEXT NOT NULL,
    phone_number    TEXT NOT NULL,
    class           TEXT NOT NULL,
    status          TEXT NOT NULL,               -- 'active' | 'pass-out'
    joining_date    TEXT NOT NULL,               -- YYYY-MM-DD
    academic_year   INTEGER NOT NULL,
    created_at      TEXT NOT NULL                -- RFC-3339, UTC
);

CREATE INDEX IF NOT EXISTS idx_students_created ON students (created_at DESC);

-- ----------------------------------------------------------------
-- Teachers
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS teachers (
    id           TEXT PRIMARY KEY NOT NULL,
    name         TEXT NOT NULL,
    phone_number TEXT NOT NULL DEFAULT '',
    joining_date TEXT NOT NULL,
    status       TEXT NOT NULL,                  -- 'Active' | 'On Leave' | 'Resigned'
    created_at   TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Fee records
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS fee_records (
    id         TEXT PRIMARY KEY NOT NULL,
    student_id TEXT NOT NULL,
    month      INTEGER NOT NULL,
    year       INTEGER NOT NULL,
    amount     REAL NOT NULL,
    status     TEXT NOT NULL,
    paid_date  TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_fee_records_student ON fee_records (student_id, year);

-- ----------------------------------------------------------------
-- Class schedules
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS class_schedules (
    id          TEXT PRIMARY KEY NOT NULL,
    class       TEXT NOT NULL,
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    start_time  TEXT NOT NULL,                   -- HH:MM:SS
    end_time    TEXT NOT NULL,
    subject     TEXT NOT NULL DEFAULT '',
    teacher_id  TEXT,
    created_at  TEXT NOT NULL,
    UNIQUE (class, day_of_week, start_time)
);

-- ----------------------------------------------------------------
-- Promotion history (undo snapshots)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS promotion_history (
    id             TEXT PRIMARY KEY NOT NULL,
    promoted_by    TEXT,
    previous_state TEXT NOT NULL,                -- JSON array of students
    promoted_at    TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_promotion_history_at ON promotion_history (promoted_at DESC);
"#;

/// Apply the initial schema.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
