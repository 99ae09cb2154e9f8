//! Registration: create a student together with its enrollments and their
//! initial statuses, then hand back the persisted aggregate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  detail::{self, StudentDetail},
  enrollment::{self, CourseEntry},
  store::Repository,
  student::StudentProfile,
};

/// A submitted registration: the new student and the courses it enrols in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub student: Option<StudentProfile>,
  #[serde(default)]
  pub courses: Vec<CourseEntry>,
}

impl Registration {
  pub fn new(student: StudentProfile) -> Self {
    Self { student: Some(student), courses: Vec::new() }
  }

  pub fn with_course(mut self, course: CourseEntry) -> Self {
    self.courses.push(course);
    self
  }

  /// Every structural check, run before the first write.
  pub fn validate(&self) -> Result<&StudentProfile> {
    let student = self
      .student
      .as_ref()
      .ok_or_else(|| Error::invalid("registration requires a student"))?;
    student.validate()?;
    for course in &self.courses {
      course.validate()?;
    }
    Ok(student)
  }
}

/// Register `registration`, stamping each course with `today` as its start.
///
/// Must run inside a single write transaction: any error after the student
/// insert leaves nothing behind once the transaction rolls back. The
/// returned detail is re-read from the store, not derived from the input.
pub fn register(
  repo: &dyn Repository,
  registration: Registration,
  today: NaiveDate,
) -> Result<StudentDetail> {
  registration.validate()?;
  let Registration { student, courses } = registration;
  let profile = student.ok_or_else(|| Error::invalid("registration requires a student"))?;

  let Some(student_id) = repo.insert_student(&profile)? else {
    tracing::error!(name = %profile.name, "student insert produced no identity");
    return Err(Error::inconsistent("no identity was generated for the new student"));
  };

  for mut course in courses {
    enrollment::initialize(&mut course, Some(student_id), today)?;
    let enrollment_id = repo.insert_enrollment(&course.to_new_enrollment()?)?;
    tracing::debug!(%student_id, %enrollment_id, course = %course.course_name, "enrolled");

    match course.status.as_deref().map(str::trim) {
      Some(status) => {
        repo.insert_status_event(enrollment_id, status)?;
      }
      None => {
        tracing::warn!(%enrollment_id, "course registered without an initial status");
      }
    }
  }

  let detail = detail::assemble(repo, student_id).map_err(|e| match e {
    Error::StudentNotFound(id) => {
      tracing::error!(%id, "registered student is not readable in its own transaction");
      Error::inconsistent(format!("registered student {id} could not be re-read"))
    }
    other => other,
  })?;

  tracing::info!(
    %student_id,
    enrollments = detail.enrollments.len(),
    "registered student"
  );
  Ok(detail)
}
