//! Enrollments (one student's membership in one course) and the
//! initializer that stamps a new enrollment with its owner and default
//! validity window.

use std::fmt;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, student::StudentId};

/// Length of the default validity window, in months.
pub const DEFAULT_TERM_MONTHS: u32 = 12;

// ─── Identity ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EnrollmentId(pub i64);

impl fmt::Display for EnrollmentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Persisted row ───────────────────────────────────────────────────────────

/// A persisted enrollment row.
///
/// `student_id` is always set by this crate, but rows written by older
/// tooling may lack it. Such orphans never appear in an assembled
/// [`StudentDetail`](crate::detail::StudentDetail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
  pub id:          EnrollmentId,
  pub student_id:  Option<StudentId>,
  pub course_name: String,
  pub start_date:  NaiveDate,
  pub end_date:    NaiveDate,
}

impl Enrollment {
  pub fn is_orphaned(&self) -> bool { self.student_id.is_none() }

  pub fn belongs_to(&self, student: StudentId) -> bool {
    self.student_id == Some(student)
  }
}

/// Input to [`Repository::insert_enrollment`](crate::store::Repository::insert_enrollment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnrollment {
  pub student_id:  StudentId,
  pub course_name: String,
  pub start_date:  NaiveDate,
  pub end_date:    NaiveDate,
}

/// Input to [`Repository::update_enrollment`](crate::store::Repository::update_enrollment).
/// Dates left as `None` keep their stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentChanges {
  pub student_id:  StudentId,
  pub course_name: String,
  pub start_date:  Option<NaiveDate>,
  pub end_date:    Option<NaiveDate>,
}

// ─── Submitted shape ─────────────────────────────────────────────────────────

/// An enrollment as submitted inside a registration or an update.
///
/// `id` is absent for brand-new enrollments. `status`, when present, is the
/// label recorded as a status event for this enrollment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEntry {
  pub id:          Option<EnrollmentId>,
  pub student_id:  Option<StudentId>,
  pub course_name: String,
  pub start_date:  Option<NaiveDate>,
  pub end_date:    Option<NaiveDate>,
  pub status:      Option<String>,
}

impl CourseEntry {
  pub fn new(course_name: impl Into<String>) -> Self {
    Self { course_name: course_name.into(), ..Default::default() }
  }

  pub fn with_status(mut self, status: impl Into<String>) -> Self {
    self.status = Some(status.into());
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.course_name.trim().is_empty() {
      return Err(Error::invalid("course name must not be blank"));
    }
    if let (Some(start), Some(end)) = (self.start_date, self.end_date)
      && end < start
    {
      return Err(Error::invalid(format!(
        "course {:?} ends ({end}) before it starts ({start})",
        self.course_name
      )));
    }
    if let Some(status) = &self.status
      && status.trim().is_empty()
    {
      return Err(Error::invalid("status label must not be blank"));
    }
    Ok(())
  }

  /// Build the insert payload. The entry must have been initialised (or
  /// carry explicit owner and dates).
  pub fn to_new_enrollment(&self) -> Result<NewEnrollment> {
    match (self.student_id, self.start_date, self.end_date) {
      (Some(student_id), Some(start_date), Some(end_date)) => Ok(NewEnrollment {
        student_id,
        course_name: self.course_name.clone(),
        start_date,
        end_date,
      }),
      _ => Err(Error::inconsistent(format!(
        "course {:?} is missing its owner or validity window",
        self.course_name
      ))),
    }
  }
}

// ─── Initializer ─────────────────────────────────────────────────────────────

/// The default end of an enrollment starting on `start`: exactly one
/// calendar year later. A 29 February start clamps to 28 February.
pub fn default_end_date(start: NaiveDate) -> Result<NaiveDate> {
  start
    .checked_add_months(Months::new(DEFAULT_TERM_MONTHS))
    .ok_or_else(|| Error::inconsistent(format!("no end date representable for {start}")))
}

/// Stamp a freshly submitted enrollment with its owner and default window.
///
/// Must run exactly once per enrollment, at creation time; running it again
/// would overwrite the stored window.
pub fn initialize(
  entry: &mut CourseEntry,
  owner: Option<StudentId>,
  today: NaiveDate,
) -> Result<()> {
  let owner = owner
    .ok_or_else(|| Error::invalid("cannot initialise an enrollment without an owner"))?;
  entry.student_id = Some(owner);
  entry.start_date = Some(today);
  entry.end_date = Some(default_end_date(today)?);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn initialize_sets_owner_and_one_year_window() {
    let mut entry = CourseEntry::new("JAVA");
    initialize(&mut entry, Some(StudentId(3)), date(2024, 4, 1)).unwrap();

    assert_eq!(entry.student_id, Some(StudentId(3)));
    assert_eq!(entry.start_date, Some(date(2024, 4, 1)));
    assert_eq!(entry.end_date, Some(date(2025, 4, 1)));
  }

  #[test]
  fn initialize_overwrites_submitted_dates() {
    let mut entry = CourseEntry {
      start_date: Some(date(2001, 1, 1)),
      end_date: Some(date(2001, 2, 1)),
      ..CourseEntry::new("JAVA")
    };
    initialize(&mut entry, Some(StudentId(1)), date(2024, 6, 30)).unwrap();
    assert_eq!(entry.start_date, Some(date(2024, 6, 30)));
    assert_eq!(entry.end_date, Some(date(2025, 6, 30)));
  }

  #[test]
  fn initialize_without_owner_is_invalid() {
    let mut entry = CourseEntry::new("JAVA");
    let err = initialize(&mut entry, None, date(2024, 1, 1)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(entry.student_id, None);
  }

  #[test]
  fn leap_day_start_clamps() {
    assert_eq!(default_end_date(date(2024, 2, 29)).unwrap(), date(2025, 2, 28));
  }

  #[test]
  fn entry_validation() {
    assert!(CourseEntry::new("JAVA").validate().is_ok());
    assert!(CourseEntry::new(" ").validate().is_err());
    assert!(CourseEntry::new("JAVA").with_status("").validate().is_err());

    let backwards = CourseEntry {
      start_date: Some(date(2024, 5, 1)),
      end_date: Some(date(2024, 4, 1)),
      ..CourseEntry::new("JAVA")
    };
    assert!(backwards.validate().is_err());
  }

  #[test]
  fn uninitialised_entry_cannot_be_inserted() {
    let err = CourseEntry::new("JAVA").to_new_enrollment().unwrap_err();
    assert!(matches!(err, Error::InconsistentState(_)));
  }
}
