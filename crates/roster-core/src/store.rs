//! The storage seam: the [`Repository`] primitives the engine consumes and
//! the [`EntityStore`] that runs them inside transactions.
//!
//! The traits are implemented by storage backends (e.g.
//! `roster-store-sqlite`). Nothing in this crate depends on a concrete
//! backend.

use std::future::Future;

use crate::{
  Result,
  enrollment::{Enrollment, EnrollmentChanges, EnrollmentId, NewEnrollment},
  status::StatusEvent,
  student::{Student, StudentId, StudentProfile, StudentUpdate},
};

// ─── Repository ──────────────────────────────────────────────────────────────

/// Table-level primitives over students, enrollments and status events.
///
/// A repository is always bound to one open transaction; every call made
/// through it commits or rolls back together. Implementations do not
/// validate business rules; that is the caller's job.
pub trait Repository {
  // ── Students ──────────────────────────────────────────────────────────

  /// Fetch a student by identity, soft-deleted or not.
  fn fetch_student(&self, id: StudentId) -> Result<Option<Student>>;

  /// All students in identity order. Soft-deleted rows are included only
  /// when `include_deleted` is set.
  fn fetch_students(&self, include_deleted: bool) -> Result<Vec<Student>>;

  /// Insert a student and return its generated identity, or `None` if the
  /// backend produced none.
  fn insert_student(&self, profile: &StudentProfile) -> Result<Option<StudentId>>;

  /// Overwrite the profile of `update.id`; returns the affected row count.
  fn update_student(&self, update: &StudentUpdate) -> Result<usize>;

  /// Set the soft-delete flag; returns the affected row count.
  fn set_student_deleted(&self, id: StudentId, deleted: bool) -> Result<usize>;

  // ── Enrollments ───────────────────────────────────────────────────────

  fn fetch_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>>;

  /// Enrollments owned by `student`, in identity order.
  fn fetch_enrollments_by_student(&self, student: StudentId) -> Result<Vec<Enrollment>>;

  /// Every enrollment row, orphans included, in identity order.
  fn fetch_all_enrollments(&self) -> Result<Vec<Enrollment>>;

  fn insert_enrollment(&self, enrollment: &NewEnrollment) -> Result<EnrollmentId>;

  /// Update an enrollment by identity; returns the affected row count.
  fn update_enrollment(
    &self,
    id: EnrollmentId,
    changes: &EnrollmentChanges,
  ) -> Result<usize>;

  // ── Status events (append-only) ───────────────────────────────────────

  /// The event with the highest identity for `enrollment`, if any.
  fn fetch_latest_status_event(&self, enrollment: EnrollmentId) -> Result<Option<StatusEvent>>;

  /// Every event for `enrollment`, in identity order.
  fn fetch_status_events(&self, enrollment: EnrollmentId) -> Result<Vec<StatusEvent>>;

  /// Append an event; the store assigns identity and timestamp.
  fn insert_status_event(&self, enrollment: EnrollmentId, status: &str) -> Result<StatusEvent>;
}

// ─── EntityStore ─────────────────────────────────────────────────────────────

/// A handle to a store that can open units of work.
///
/// Each call runs `work` against a [`Repository`] bound to a fresh
/// transaction. `write` commits only when `work` returns `Ok`; any error
/// rolls the whole unit back. `read` never commits anything.
///
/// Both methods return `Send` futures so the store can be shared across a
/// multi-threaded runtime (e.g. tokio with `axum`).
pub trait EntityStore: Send + Sync + 'static {
  fn read<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&dyn Repository) -> Result<T> + Send + 'static;

  fn write<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&dyn Repository) -> Result<T> + Send + 'static;
}
