//! Updates: the student row alone, the student together with its courses,
//! and soft deletion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  enrollment::{self, CourseEntry, EnrollmentChanges, EnrollmentId, NewEnrollment},
  status,
  store::Repository,
  student::{Student, StudentId, StudentUpdate},
};

/// A submitted update of a student and (optionally) its courses.
///
/// Courses with an `id` are updated in place when that enrollment belongs
/// to the student; any other course is inserted. A missing or empty course
/// list performs no course writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailUpdate {
  pub student: Option<StudentUpdate>,
  #[serde(default)]
  pub courses: Option<Vec<CourseEntry>>,
}

impl DetailUpdate {
  pub fn new(student: StudentUpdate) -> Self {
    Self { student: Some(student), courses: None }
  }

  pub fn with_course(mut self, course: CourseEntry) -> Self {
    self.courses.get_or_insert_with(Vec::new).push(course);
    self
  }

  fn validate(&self) -> Result<&StudentUpdate> {
    let student = self
      .student
      .as_ref()
      .ok_or_else(|| Error::invalid("update requires a student"))?;
    student.profile.validate()?;
    for course in self.courses.iter().flatten() {
      course.validate()?;
    }
    Ok(student)
  }
}

/// What an update wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
  pub enrollments_updated:  usize,
  pub enrollments_inserted: usize,
  pub statuses_recorded:    usize,
}

/// Update only the student row and return it as stored.
pub fn update_student(repo: &dyn Repository, update: &StudentUpdate) -> Result<Student> {
  update.profile.validate()?;
  if repo.update_student(update)? == 0 {
    return Err(Error::StudentNotFound(update.id));
  }
  repo.fetch_student(update.id)?.ok_or_else(|| {
    tracing::error!(id = %update.id, "updated student vanished within its transaction");
    Error::inconsistent(format!("updated student {} could not be re-read", update.id))
  })
}

/// Update a student and upsert each submitted course.
///
/// Must run inside a single write transaction. An unknown student fails
/// with [`Error::StudentNotFound`] before any course is touched. `today`
/// seeds the validity window of inserted courses that carry no dates.
pub fn update_with_courses(
  repo: &dyn Repository,
  update: DetailUpdate,
  today: NaiveDate,
) -> Result<UpdateSummary> {
  let student = update.validate()?;
  let student_id = student.id;

  if repo.update_student(student)? == 0 {
    return Err(Error::StudentNotFound(student_id));
  }

  let mut summary = UpdateSummary::default();
  for course in update.courses.into_iter().flatten() {
    let enrollment_id = upsert_course(repo, student_id, &course, today, &mut summary)?;

    if let Some(label) = course.status.as_deref().map(str::trim)
      && status::current_label(repo, enrollment_id)?.as_deref() != Some(label)
    {
      repo.insert_status_event(enrollment_id, label)?;
      summary.statuses_recorded += 1;
    }
  }

  tracing::info!(
    %student_id,
    updated = summary.enrollments_updated,
    inserted = summary.enrollments_inserted,
    statuses = summary.statuses_recorded,
    "updated student with courses"
  );
  Ok(summary)
}

/// Try an update by identity first and fall back to an insert.
fn upsert_course(
  repo: &dyn Repository,
  student_id: StudentId,
  course: &CourseEntry,
  today: NaiveDate,
  summary: &mut UpdateSummary,
) -> Result<EnrollmentId> {
  if let Some(id) = course.id {
    let changes = EnrollmentChanges {
      student_id,
      course_name: course.course_name.clone(),
      start_date: course.start_date,
      end_date: course.end_date,
    };
    if repo.update_enrollment(id, &changes)? > 0 {
      check_window(repo, id)?;
      tracing::debug!(%student_id, enrollment_id = %id, "updated enrollment");
      summary.enrollments_updated += 1;
      return Ok(id);
    }
    tracing::debug!(%student_id, enrollment_id = %id, "no owned enrollment to update, inserting");
  }

  let start_date = course.start_date.unwrap_or(today);
  let end_date = match course.end_date {
    Some(end) => end,
    None => enrollment::default_end_date(start_date)?,
  };
  let id = repo.insert_enrollment(&NewEnrollment {
    student_id,
    course_name: course.course_name.clone(),
    start_date,
    end_date,
  })?;
  tracing::debug!(%student_id, enrollment_id = %id, "inserted enrollment");
  summary.enrollments_inserted += 1;
  Ok(id)
}

/// Re-read an updated enrollment and reject it if the stored window ends
/// before it starts. A date left out of the update keeps its stored value.
fn check_window(repo: &dyn Repository, id: EnrollmentId) -> Result<()> {
  let stored = repo.fetch_enrollment(id)?.ok_or_else(|| {
    tracing::error!(enrollment_id = %id, "updated enrollment vanished within its transaction");
    Error::inconsistent(format!("updated enrollment {id} could not be re-read"))
  })?;
  if stored.end_date < stored.start_date {
    return Err(Error::invalid(format!(
      "course {:?} would end ({}) before it starts ({})",
      stored.course_name, stored.end_date, stored.start_date
    )));
  }
  Ok(())
}

/// Soft-delete a student. Enrollments and status events are kept.
pub fn soft_delete(repo: &dyn Repository, id: StudentId) -> Result<()> {
  if repo.set_student_deleted(id, true)? == 0 {
    return Err(Error::StudentNotFound(id));
  }
  tracing::info!(%id, "soft-deleted student");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    detail,
    registration::{self, Registration},
    student::StudentProfile,
    testing::MemoryRepository,
  };

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() }

  fn registered(repo: &MemoryRepository, courses: &[&str]) -> crate::detail::StudentDetail {
    let mut registration = Registration::new(StudentProfile::new("Aya"));
    for course in courses {
      registration = registration.with_course(CourseEntry::new(*course).with_status("provisional"));
    }
    registration::register(repo, registration, today()).unwrap()
  }

  fn renamed(id: StudentId, name: &str) -> StudentUpdate {
    StudentUpdate { id, profile: StudentProfile::new(name), is_deleted: None }
  }

  #[test]
  fn two_updates_and_one_insert() {
    let repo = MemoryRepository::default();
    let before = registered(&repo, &["JAVA", "AWS"]);
    let id = before.student.id;

    let mut update = DetailUpdate::new(renamed(id, "Aya Sato"));
    for e in &before.enrollments {
      update = update.with_course(CourseEntry {
        id: Some(e.id),
        ..CourseEntry::new(format!("{} Advanced", e.course_name))
      });
    }
    update = update.with_course(CourseEntry::new("Design"));

    let summary = update_with_courses(&repo, update, today()).unwrap();
    assert_eq!(summary.enrollments_updated, 2);
    assert_eq!(summary.enrollments_inserted, 1);
    assert_eq!(summary.statuses_recorded, 0);

    let after = detail::assemble(&repo, id).unwrap();
    assert_eq!(after.student.profile.name, "Aya Sato");
    let names: Vec<_> = after.enrollments.iter().map(|e| e.course_name.as_str()).collect();
    assert_eq!(names, ["JAVA Advanced", "AWS Advanced", "Design"]);
    // Existing windows are kept when no dates are submitted.
    assert_eq!(after.enrollments[0].start_date, before.enrollments[0].start_date);
    assert_eq!(after.enrollments[2].start_date, today());
  }

  #[test]
  fn unknown_student_is_not_found_and_writes_no_courses() {
    let repo = MemoryRepository::default();
    let update = DetailUpdate::new(renamed(StudentId(404), "Nobody"))
      .with_course(CourseEntry::new("JAVA"));

    let err = repo
      .transaction(|repo| update_with_courses(repo, update, today()))
      .unwrap_err();
    assert!(matches!(err, Error::StudentNotFound(StudentId(404))));
    assert_eq!(repo.enrollment_count(), 0);
  }

  #[test]
  fn absent_or_empty_course_list_writes_nothing_course_side() {
    let repo = MemoryRepository::default();
    let before = registered(&repo, &["JAVA"]);
    let id = before.student.id;

    let summary = update_with_courses(&repo, DetailUpdate::new(renamed(id, "A")), today()).unwrap();
    assert_eq!(summary, UpdateSummary::default());

    let empty = DetailUpdate { student: Some(renamed(id, "B")), courses: Some(Vec::new()) };
    let summary = update_with_courses(&repo, empty, today()).unwrap();
    assert_eq!(summary, UpdateSummary::default());
    assert_eq!(repo.enrollment_count(), 1);
  }

  #[test]
  fn missing_student_is_invalid() {
    let repo = MemoryRepository::default();
    let update = DetailUpdate { student: None, courses: None };
    let err = update_with_courses(&repo, update, today()).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
  }

  #[test]
  fn changed_status_appends_an_event_and_same_status_does_not() {
    let repo = MemoryRepository::default();
    let before = registered(&repo, &["JAVA"]);
    let id = before.student.id;
    let enrollment = before.enrollments[0].id;

    let same = DetailUpdate::new(renamed(id, "Aya")).with_course(CourseEntry {
      id: Some(enrollment),
      ..CourseEntry::new("JAVA").with_status("provisional")
    });
    assert_eq!(update_with_courses(&repo, same, today()).unwrap().statuses_recorded, 0);

    let changed = DetailUpdate::new(renamed(id, "Aya")).with_course(CourseEntry {
      id: Some(enrollment),
      ..CourseEntry::new("JAVA").with_status("confirmed")
    });
    assert_eq!(update_with_courses(&repo, changed, today()).unwrap().statuses_recorded, 1);

    let after = detail::assemble(&repo, id).unwrap();
    assert_eq!(after.status_of(enrollment), Some("confirmed"));
    assert_eq!(repo.status_event_count(), 2);
  }

  #[test]
  fn another_students_enrollment_is_not_taken_over() {
    let repo = MemoryRepository::default();
    let aya = registered(&repo, &["JAVA"]);
    let ken = registration::register(&repo, Registration::new(StudentProfile::new("Ken")), today())
      .unwrap();

    let update = DetailUpdate::new(renamed(ken.student.id, "Ken")).with_course(CourseEntry {
      id: Some(aya.enrollments[0].id),
      ..CourseEntry::new("Hijacked")
    });
    let summary = update_with_courses(&repo, update, today()).unwrap();
    assert_eq!(summary.enrollments_inserted, 1);

    let aya_after = detail::assemble(&repo, aya.student.id).unwrap();
    assert_eq!(aya_after.enrollments[0].course_name, "JAVA");
  }

  #[test]
  fn one_sided_date_update_cannot_invert_the_window() {
    let repo = MemoryRepository::default();
    let before = registered(&repo, &["JAVA"]);
    let id = before.student.id;
    let java = before.enrollments[0].clone();
    let later = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let earlier = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

    let late_start = DetailUpdate::new(renamed(id, "Aya Sato")).with_course(CourseEntry {
      id: Some(java.id),
      start_date: Some(later),
      ..CourseEntry::new("JAVA")
    });
    let err = repo
      .transaction(|repo| update_with_courses(repo, late_start, today()))
      .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let early_end = DetailUpdate::new(renamed(id, "Aya Sato")).with_course(CourseEntry {
      id: Some(java.id),
      end_date: Some(earlier),
      ..CourseEntry::new("JAVA")
    });
    let err = repo
      .transaction(|repo| update_with_courses(repo, early_end, today()))
      .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let after = detail::assemble(&repo, id).unwrap();
    assert_eq!(after.student.profile.name, "Aya");
    assert_eq!(after.enrollments, [java]);
  }

  #[test]
  fn update_student_alone() {
    let repo = MemoryRepository::default();
    let id = registered(&repo, &[]).student.id;

    let student = update_student(&repo, &renamed(id, "Aya Sato")).unwrap();
    assert_eq!(student.profile.name, "Aya Sato");

    let err = update_student(&repo, &renamed(StudentId(9), "x")).unwrap_err();
    assert!(matches!(err, Error::StudentNotFound(_)));
  }

  #[test]
  fn soft_delete_keeps_the_row_and_its_courses() {
    let repo = MemoryRepository::default();
    let id = registered(&repo, &["JAVA"]).student.id;

    soft_delete(&repo, id).unwrap();
    let detail = detail::assemble(&repo, id).unwrap();
    assert!(detail.student.is_deleted);
    assert_eq!(detail.enrollments.len(), 1);
    assert_eq!(detail.statuses.len(), 1);

    assert!(soft_delete(&repo, StudentId(77)).unwrap_err().is_not_found());
  }
}
