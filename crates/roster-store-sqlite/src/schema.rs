//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS students (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL,
    furigana    TEXT,
    nickname    TEXT,
    email       TEXT,
    region      TEXT,
    age         INTEGER CHECK (age BETWEEN 0 AND 120),
    gender      TEXT,              -- free text as submitted
    remark      TEXT,
    is_deleted  INTEGER NOT NULL DEFAULT 0
);

-- student_id is nullable: rows left behind by older tooling may have no
-- owner. Such orphans are never assembled into a student detail.
CREATE TABLE IF NOT EXISTS enrollments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id  INTEGER REFERENCES students(id),
    course_name TEXT    NOT NULL,
    start_date  TEXT    NOT NULL,  -- ISO 8601 calendar date
    end_date    TEXT    NOT NULL
);

-- Status events are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS status_events (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    enrollment_id INTEGER NOT NULL REFERENCES enrollments(id),
    status        TEXT    NOT NULL,
    recorded_at   TEXT    NOT NULL  -- RFC 3339 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS students_deleted_idx      ON students(is_deleted);
CREATE INDEX IF NOT EXISTS enrollments_student_idx   ON enrollments(student_id);
CREATE INDEX IF NOT EXISTS status_events_enrollment_idx
    ON status_events(enrollment_id, id);

PRAGMA user_version = 1;
";
