//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as ISO 8601 `YYYY-MM-DD` strings, timestamps as
//! RFC 3339 strings. Identities are stored as SQLite integers.

use chrono::{DateTime, NaiveDate, Utc};
use roster_core::{
  enrollment::{Enrollment, EnrollmentId},
  status::{StatusEvent, StatusEventId},
  student::{Student, StudentId, StudentProfile},
};

use crate::{Error, Result};

/// Column list matching [`RawStudent::from_row`].
pub const STUDENT_COLUMNS: &str =
  "id, name, furigana, nickname, email, region, age, gender, remark, is_deleted";

/// Column list matching [`RawEnrollment::from_row`].
pub const ENROLLMENT_COLUMNS: &str = "id, student_id, course_name, start_date, end_date";

/// Column list matching [`RawStatusEvent::from_row`].
pub const STATUS_EVENT_COLUMNS: &str = "id, enrollment_id, status, recorded_at";

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Age ─────────────────────────────────────────────────────────────────────

fn decode_age(age: Option<i64>) -> Result<Option<u8>> {
  age
    .map(|v| u8::try_from(v).map_err(|_| Error::OutOfRange { column: "age", value: v }))
    .transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `students` row.
pub struct RawStudent {
  pub id:         i64,
  pub name:       String,
  pub furigana:   Option<String>,
  pub nickname:   Option<String>,
  pub email:      Option<String>,
  pub region:     Option<String>,
  pub age:        Option<i64>,
  pub gender:     Option<String>,
  pub remark:     Option<String>,
  pub is_deleted: bool,
}

impl RawStudent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      furigana:   row.get(2)?,
      nickname:   row.get(3)?,
      email:      row.get(4)?,
      region:     row.get(5)?,
      age:        row.get(6)?,
      gender:     row.get(7)?,
      remark:     row.get(8)?,
      is_deleted: row.get(9)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      id:         StudentId(self.id),
      profile:    StudentProfile {
        name:     self.name,
        furigana: self.furigana,
        nickname: self.nickname,
        email:    self.email,
        region:   self.region,
        age:      decode_age(self.age)?,
        gender:   self.gender,
        remark:   self.remark,
      },
      is_deleted: self.is_deleted,
    })
  }
}

/// Raw values read directly from an `enrollments` row.
pub struct RawEnrollment {
  pub id:          i64,
  pub student_id:  Option<i64>,
  pub course_name: String,
  pub start_date:  String,
  pub end_date:    String,
}

impl RawEnrollment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      student_id:  row.get(1)?,
      course_name: row.get(2)?,
      start_date:  row.get(3)?,
      end_date:    row.get(4)?,
    })
  }

  pub fn into_enrollment(self) -> Result<Enrollment> {
    Ok(Enrollment {
      id:          EnrollmentId(self.id),
      student_id:  self.student_id.map(StudentId),
      course_name: self.course_name,
      start_date:  decode_date(&self.start_date)?,
      end_date:    decode_date(&self.end_date)?,
    })
  }
}

/// Raw values read directly from a `status_events` row.
pub struct RawStatusEvent {
  pub id:            i64,
  pub enrollment_id: i64,
  pub status:        String,
  pub recorded_at:   String,
}

impl RawStatusEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      enrollment_id: row.get(1)?,
      status:        row.get(2)?,
      recorded_at:   row.get(3)?,
    })
  }

  pub fn into_event(self) -> Result<StatusEvent> {
    Ok(StatusEvent {
      id:            StatusEventId(self.id),
      enrollment_id: EnrollmentId(self.enrollment_id),
      status:        self.status,
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}
