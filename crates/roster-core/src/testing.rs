//! In-memory [`Repository`] used by the engine's unit tests.
//!
//! `transaction` snapshots the tables and restores them when the work
//! fails, standing in for a backend's native rollback. Faults can be
//! injected to exercise the rollback paths.

use std::{
  cell::{Cell, RefCell},
  collections::BTreeMap,
  io,
};

use chrono::{NaiveDate, Utc};

use crate::{
  Error, Result,
  enrollment::{Enrollment, EnrollmentChanges, EnrollmentId, NewEnrollment},
  status::{StatusEvent, StatusEventId},
  store::Repository,
  student::{Student, StudentId, StudentProfile, StudentUpdate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
  /// `insert_student` writes the row but reports no identity.
  NoStudentIdentity,
  /// `insert_enrollment` fails once `after` inserts have succeeded.
  EnrollmentInsert { after: usize },
}

#[derive(Debug, Clone, Default)]
struct Tables {
  students:    BTreeMap<StudentId, Student>,
  enrollments: BTreeMap<EnrollmentId, Enrollment>,
  events:      BTreeMap<StatusEventId, StatusEvent>,
  last_id:     i64,
}

impl Tables {
  fn next_id(&mut self) -> i64 {
    self.last_id += 1;
    self.last_id
  }
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
  tables:             RefCell<Tables>,
  fault:              Cell<Option<Fault>>,
  writes:             Cell<usize>,
  enrollment_inserts: Cell<usize>,
  leak_orphans:       Cell<bool>,
}

impl MemoryRepository {
  pub fn inject(&self, fault: Fault) { self.fault.set(Some(fault)); }

  /// Make `fetch_enrollments_by_student` also return ownerless rows, the
  /// way a careless outer join would.
  pub fn leak_orphans_into_student_queries(&self) { self.leak_orphans.set(true); }

  pub fn transaction<T>(
    &self,
    work: impl FnOnce(&dyn Repository) -> Result<T>,
  ) -> Result<T> {
    let snapshot = self.tables.borrow().clone();
    let out = work(self);
    if out.is_err() {
      *self.tables.borrow_mut() = snapshot;
    }
    out
  }

  pub fn insert_orphan_enrollment(&self, course_name: &str) -> EnrollmentId {
    let mut tables = self.tables.borrow_mut();
    let id = EnrollmentId(tables.next_id());
    let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
    tables.enrollments.insert(id, Enrollment {
      id,
      student_id: None,
      course_name: course_name.into(),
      start_date: day,
      end_date: day,
    });
    id
  }

  pub fn write_count(&self) -> usize { self.writes.get() }

  pub fn student_count(&self) -> usize { self.tables.borrow().students.len() }

  pub fn enrollment_count(&self) -> usize { self.tables.borrow().enrollments.len() }

  pub fn status_event_count(&self) -> usize { self.tables.borrow().events.len() }

  fn wrote(&self) { self.writes.set(self.writes.get() + 1); }
}

fn injected(what: &str) -> Error {
  Error::store(io::Error::other(format!("injected failure: {what}")))
}

impl Repository for MemoryRepository {
  fn fetch_student(&self, id: StudentId) -> Result<Option<Student>> {
    Ok(self.tables.borrow().students.get(&id).cloned())
  }

  fn fetch_students(&self, include_deleted: bool) -> Result<Vec<Student>> {
    Ok(
      self
        .tables
        .borrow()
        .students
        .values()
        .filter(|s| include_deleted || !s.is_deleted)
        .cloned()
        .collect(),
    )
  }

  fn insert_student(&self, profile: &StudentProfile) -> Result<Option<StudentId>> {
    self.wrote();
    let mut tables = self.tables.borrow_mut();
    let id = StudentId(tables.next_id());
    tables.students.insert(id, Student {
      id,
      profile: profile.clone(),
      is_deleted: false,
    });
    match self.fault.get() {
      Some(Fault::NoStudentIdentity) => Ok(None),
      _ => Ok(Some(id)),
    }
  }

  fn update_student(&self, update: &StudentUpdate) -> Result<usize> {
    self.wrote();
    let mut tables = self.tables.borrow_mut();
    let Some(student) = tables.students.get_mut(&update.id) else {
      return Ok(0);
    };
    student.profile = update.profile.clone();
    if let Some(deleted) = update.is_deleted {
      student.is_deleted = deleted;
    }
    Ok(1)
  }

  fn set_student_deleted(&self, id: StudentId, deleted: bool) -> Result<usize> {
    self.wrote();
    let mut tables = self.tables.borrow_mut();
    Ok(match tables.students.get_mut(&id) {
      Some(student) => {
        student.is_deleted = deleted;
        1
      }
      None => 0,
    })
  }

  fn fetch_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>> {
    Ok(self.tables.borrow().enrollments.get(&id).cloned())
  }

  fn fetch_enrollments_by_student(&self, student: StudentId) -> Result<Vec<Enrollment>> {
    let leak = self.leak_orphans.get();
    Ok(
      self
        .tables
        .borrow()
        .enrollments
        .values()
        .filter(|e| e.belongs_to(student) || (leak && e.is_orphaned()))
        .cloned()
        .collect(),
    )
  }

  fn fetch_all_enrollments(&self) -> Result<Vec<Enrollment>> {
    Ok(self.tables.borrow().enrollments.values().cloned().collect())
  }

  fn insert_enrollment(&self, enrollment: &NewEnrollment) -> Result<EnrollmentId> {
    if let Some(Fault::EnrollmentInsert { after }) = self.fault.get()
      && self.enrollment_inserts.get() >= after
    {
      return Err(injected("insert_enrollment"));
    }
    self.wrote();
    self.enrollment_inserts.set(self.enrollment_inserts.get() + 1);
    let mut tables = self.tables.borrow_mut();
    let id = EnrollmentId(tables.next_id());
    tables.enrollments.insert(id, Enrollment {
      id,
      student_id: Some(enrollment.student_id),
      course_name: enrollment.course_name.clone(),
      start_date: enrollment.start_date,
      end_date: enrollment.end_date,
    });
    Ok(id)
  }

  fn update_enrollment(
    &self,
    id: EnrollmentId,
    changes: &EnrollmentChanges,
  ) -> Result<usize> {
    self.wrote();
    let mut tables = self.tables.borrow_mut();
    let Some(row) = tables
      .enrollments
      .get_mut(&id)
      .filter(|row| row.belongs_to(changes.student_id))
    else {
      return Ok(0);
    };
    row.course_name = changes.course_name.clone();
    if let Some(start) = changes.start_date {
      row.start_date = start;
    }
    if let Some(end) = changes.end_date {
      row.end_date = end;
    }
    Ok(1)
  }

  fn fetch_latest_status_event(&self, enrollment: EnrollmentId) -> Result<Option<StatusEvent>> {
    let events = self.fetch_status_events(enrollment)?;
    Ok(events.into_iter().max_by_key(|event| event.id))
  }

  fn fetch_status_events(&self, enrollment: EnrollmentId) -> Result<Vec<StatusEvent>> {
    Ok(
      self
        .tables
        .borrow()
        .events
        .values()
        .filter(|e| e.enrollment_id == enrollment)
        .cloned()
        .collect(),
    )
  }

  fn insert_status_event(&self, enrollment: EnrollmentId, status: &str) -> Result<StatusEvent> {
    self.wrote();
    let mut tables = self.tables.borrow_mut();
    let event = StatusEvent {
      id:            StatusEventId(tables.next_id()),
      enrollment_id: enrollment,
      status:        status.into(),
      recorded_at:   Utc::now(),
    };
    tables.events.insert(event.id, event.clone());
    Ok(event)
  }
}
