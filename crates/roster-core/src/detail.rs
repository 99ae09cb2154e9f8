//! The student detail aggregate and the assembler that builds it.
//!
//! A [`StudentDetail`] is never stored and never cached; it is rebuilt from
//! the three tables on every read. Writes always go through the rows, never
//! through the aggregate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  enrollment::Enrollment,
  status::{self, CourseStatus},
  store::Repository,
  student::{Student, StudentId},
};

/// One student with its enrollments and their resolved current statuses.
///
/// `statuses` follows the order of `enrollments` but skips enrollments that
/// have no status yet, so it may be shorter. Each entry names the
/// enrollment it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetail {
  pub student:     Student,
  pub enrollments: Vec<Enrollment>,
  pub statuses:    Vec<CourseStatus>,
}

impl StudentDetail {
  /// The current status label of one of this student's enrollments.
  pub fn status_of(&self, enrollment: crate::enrollment::EnrollmentId) -> Option<&str> {
    self
      .statuses
      .iter()
      .find(|s| s.enrollment_id == enrollment)
      .map(|s| s.status.as_str())
  }
}

/// Assemble the detail of the student with identity `id`.
///
/// Soft-deleted students are still addressable here.
pub fn assemble(repo: &dyn Repository, id: StudentId) -> Result<StudentDetail> {
  let student = repo
    .fetch_student(id)?
    .ok_or(Error::StudentNotFound(id))?;
  let enrollments = repo.fetch_enrollments_by_student(id)?;
  compose(repo, student, enrollments)
}

/// Assemble every student that passes `predicate`.
///
/// Soft-deleted students are skipped unless `include_deleted` is set.
/// Enrollment rows are fetched once and grouped by owner; rows with no
/// owner are dropped.
pub fn assemble_all<P>(
  repo: &dyn Repository,
  include_deleted: bool,
  predicate: P,
) -> Result<Vec<StudentDetail>>
where
  P: Fn(&StudentDetail) -> bool,
{
  let students = repo.fetch_students(include_deleted)?;

  let mut by_owner: BTreeMap<StudentId, Vec<Enrollment>> = BTreeMap::new();
  for enrollment in repo.fetch_all_enrollments()? {
    if let Some(owner) = enrollment.student_id {
      by_owner.entry(owner).or_default().push(enrollment);
    }
  }

  let mut details = Vec::with_capacity(students.len());
  for student in students {
    let enrollments = by_owner.remove(&student.id).unwrap_or_default();
    let detail = compose(repo, student, enrollments)?;
    if predicate(&detail) {
      details.push(detail);
    }
  }
  Ok(details)
}

/// Join a student with its enrollments and resolve each current status.
fn compose(
  repo: &dyn Repository,
  student: Student,
  mut enrollments: Vec<Enrollment>,
) -> Result<StudentDetail> {
  // A malformed join could hand back rows that are not this student's.
  enrollments.retain(|e| e.belongs_to(student.id));
  enrollments.sort_by_key(|e| e.id);

  let mut statuses = Vec::with_capacity(enrollments.len());
  for enrollment in &enrollments {
    if let Some(event) = status::current(repo, enrollment.id)? {
      statuses.push(CourseStatus::new(enrollment, event));
    }
  }

  Ok(StudentDetail { student, enrollments, statuses })
}
