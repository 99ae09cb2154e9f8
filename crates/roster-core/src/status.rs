//! Status events and the resolver that reduces an enrollment's history to
//! its current status.
//!
//! Status events are append-only. "Changing" a status means inserting a new
//! event; the current status is the event with the highest identity. An
//! enrollment with no events has no current status. Nothing here ever
//! substitutes a placeholder label for a missing one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  enrollment::{Enrollment, EnrollmentId},
  store::Repository,
};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Store-generated, strictly increasing identity of a status event.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StatusEventId(pub i64);

impl fmt::Display for StatusEventId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// One immutable assertion that an enrollment held `status` as of its
/// insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
  pub id:            StatusEventId,
  pub enrollment_id: EnrollmentId,
  pub status:        String,
  /// Server-assigned insertion timestamp.
  pub recorded_at:   DateTime<Utc>,
}

/// A resolved current status, as carried by a
/// [`StudentDetail`](crate::detail::StudentDetail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStatus {
  pub enrollment_id: EnrollmentId,
  pub course_name:   String,
  pub status:        String,
}

impl CourseStatus {
  pub fn new(enrollment: &Enrollment, event: StatusEvent) -> Self {
    Self {
      enrollment_id: enrollment.id,
      course_name:   enrollment.course_name.clone(),
      status:        event.status,
    }
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Resolve the current status event of `enrollment`: the one with the
/// highest identity. Ties on insertion time are irrelevant.
///
/// Unknown enrollments resolve to `None` rather than an error: during a
/// registration the enrollment may not be visible yet.
pub fn current(
  repo: &dyn Repository,
  enrollment: EnrollmentId,
) -> Result<Option<StatusEvent>> {
  let event = repo.fetch_latest_status_event(enrollment)?;
  match event {
    Some(event) if event.enrollment_id != enrollment => {
      Err(Error::inconsistent(format!(
        "status event {} resolved for enrollment {enrollment} belongs to enrollment {}",
        event.id, event.enrollment_id
      )))
    }
    other => Ok(other),
  }
}

/// Resolve only the label of the current status.
pub fn current_label(
  repo: &dyn Repository,
  enrollment: EnrollmentId,
) -> Result<Option<String>> {
  Ok(current(repo, enrollment)?.map(|event| event.status))
}

/// Append a new status event for an existing enrollment.
pub fn record(
  repo: &dyn Repository,
  enrollment: EnrollmentId,
  status: &str,
) -> Result<StatusEvent> {
  let status = status.trim();
  if status.is_empty() {
    return Err(Error::invalid("status label must not be blank"));
  }
  if repo.fetch_enrollment(enrollment)?.is_none() {
    return Err(Error::EnrollmentNotFound(enrollment));
  }
  let event = repo.insert_status_event(enrollment, status)?;
  tracing::debug!(%enrollment, event = %event.id, status, "recorded status event");
  Ok(event)
}

/// Full status history of an enrollment, oldest first.
pub fn history(
  repo: &dyn Repository,
  enrollment: EnrollmentId,
) -> Result<Vec<StatusEvent>> {
  if repo.fetch_enrollment(enrollment)?.is_none() {
    return Err(Error::EnrollmentNotFound(enrollment));
  }
  let mut events = repo.fetch_status_events(enrollment)?;
  events.sort_by_key(|event| event.id);
  Ok(events)
}
