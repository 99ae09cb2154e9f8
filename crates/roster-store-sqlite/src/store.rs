//! [`SqliteStore`], the SQLite implementation of [`EntityStore`], and
//! [`SqliteRepository`], the table primitives bound to one transaction.

use std::{future::Future, path::Path};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};

use roster_core::{
  enrollment::{Enrollment, EnrollmentChanges, EnrollmentId, NewEnrollment},
  status::{StatusEvent, StatusEventId},
  store::{EntityStore, Repository},
  student::{Student, StudentId, StudentProfile, StudentUpdate},
};

use crate::{
  Error, Result,
  encode::{
    ENROLLMENT_COLUMNS, RawEnrollment, RawStatusEvent, RawStudent, STATUS_EVENT_COLUMNS,
    STUDENT_COLUMNS, encode_date, encode_dt,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster store backed by a single SQLite file.
///
/// Every unit of work, read or write, runs on the one background thread
/// owned by the connection, so units are serialised rather than run side
/// by side. Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
  Read,
  Write,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the connection, outside any unit of work. Tests
  /// use it to seed rows the engine would never write.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: impl Into<String>) -> Result<()> {
    let sql = sql.into();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `work` inside one transaction on the connection thread. A write
  /// unit commits only when `work` succeeds; everything else is dropped,
  /// which rolls the transaction back.
  async fn unit<T, F>(&self, kind: Unit, work: F) -> roster_core::Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&dyn Repository) -> roster_core::Result<T> + Send + 'static,
  {
    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = work(&SqliteRepository::new(&tx));
        match &out {
          Ok(_) if kind == Unit::Write => tx.commit()?,
          Ok(_) => {}
          Err(e) => tracing::debug!(error = %e, ?kind, "rolling back unit of work"),
        }
        Ok(out)
      })
      .await
      .map_err(Error::from)?;
    out
  }
}

// ─── EntityStore impl ────────────────────────────────────────────────────────

impl EntityStore for SqliteStore {
  fn read<T, F>(&self, work: F) -> impl Future<Output = roster_core::Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&dyn Repository) -> roster_core::Result<T> + Send + 'static,
  {
    self.unit(Unit::Read, work)
  }

  fn write<T, F>(&self, work: F) -> impl Future<Output = roster_core::Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&dyn Repository) -> roster_core::Result<T> + Send + 'static,
  {
    self.unit(Unit::Write, work)
  }
}

// ─── Repository ──────────────────────────────────────────────────────────────

/// Table primitives over a borrowed connection, normally an open
/// [`rusqlite::Transaction`].
pub struct SqliteRepository<'a> {
  conn: &'a Connection,
}

impl<'a> SqliteRepository<'a> {
  pub fn new(conn: &'a Connection) -> Self { Self { conn } }

  fn run<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> roster_core::Result<T> {
    f(self.conn).map_err(Into::into)
  }

  fn query_students(&self, conn: &Connection, include_deleted: bool) -> Result<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
      "SELECT {STUDENT_COLUMNS} FROM students
       WHERE ?1 OR is_deleted = 0
       ORDER BY id"
    ))?;
    let raws = stmt
      .query_map(rusqlite::params![include_deleted], RawStudent::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawStudent::into_student).collect()
  }

  fn query_enrollments(
    &self,
    conn: &Connection,
    owner: Option<StudentId>,
  ) -> Result<Vec<Enrollment>> {
    let raws = match owner {
      Some(StudentId(owner)) => {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE student_id = ?1 ORDER BY id"
        ))?;
        stmt
          .query_map(rusqlite::params![owner], RawEnrollment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?
      }
      None => {
        let mut stmt =
          conn.prepare(&format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments ORDER BY id"))?;
        stmt
          .query_map([], RawEnrollment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?
      }
    };
    raws.into_iter().map(RawEnrollment::into_enrollment).collect()
  }
}

impl Repository for SqliteRepository<'_> {
  // ── Students ──────────────────────────────────────────────────────────────

  fn fetch_student(&self, id: StudentId) -> roster_core::Result<Option<Student>> {
    self.run(|conn| {
      let raw = conn
        .query_row(
          &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
          rusqlite::params![id.0],
          RawStudent::from_row,
        )
        .optional()?;
      raw.map(RawStudent::into_student).transpose()
    })
  }

  fn fetch_students(&self, include_deleted: bool) -> roster_core::Result<Vec<Student>> {
    self.run(|conn| self.query_students(conn, include_deleted))
  }

  fn insert_student(&self, p: &StudentProfile) -> roster_core::Result<Option<StudentId>> {
    self.run(|conn| {
      let id: Option<i64> = conn
        .query_row(
          "INSERT INTO students (name, furigana, nickname, email, region, age, gender, remark)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           RETURNING id",
          rusqlite::params![
            p.name, p.furigana, p.nickname, p.email, p.region, p.age, p.gender, p.remark,
          ],
          |row| row.get(0),
        )
        .optional()?;
      Ok(id.map(StudentId))
    })
  }

  fn update_student(&self, update: &StudentUpdate) -> roster_core::Result<usize> {
    let p = &update.profile;
    self.run(|conn| {
      Ok(conn.execute(
        "UPDATE students SET
           name = ?2, furigana = ?3, nickname = ?4, email = ?5, region = ?6,
           age = ?7, gender = ?8, remark = ?9,
           is_deleted = COALESCE(?10, is_deleted)
         WHERE id = ?1",
        rusqlite::params![
          update.id.0,
          p.name,
          p.furigana,
          p.nickname,
          p.email,
          p.region,
          p.age,
          p.gender,
          p.remark,
          update.is_deleted,
        ],
      )?)
    })
  }

  fn set_student_deleted(&self, id: StudentId, deleted: bool) -> roster_core::Result<usize> {
    self.run(|conn| {
      Ok(conn.execute(
        "UPDATE students SET is_deleted = ?2 WHERE id = ?1",
        rusqlite::params![id.0, deleted],
      )?)
    })
  }

  // ── Enrollments ───────────────────────────────────────────────────────────

  fn fetch_enrollment(&self, id: EnrollmentId) -> roster_core::Result<Option<Enrollment>> {
    self.run(|conn| {
      let raw = conn
        .query_row(
          &format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = ?1"),
          rusqlite::params![id.0],
          RawEnrollment::from_row,
        )
        .optional()?;
      raw.map(RawEnrollment::into_enrollment).transpose()
    })
  }

  fn fetch_enrollments_by_student(
    &self,
    student: StudentId,
  ) -> roster_core::Result<Vec<Enrollment>> {
    self.run(|conn| self.query_enrollments(conn, Some(student)))
  }

  fn fetch_all_enrollments(&self) -> roster_core::Result<Vec<Enrollment>> {
    self.run(|conn| self.query_enrollments(conn, None))
  }

  fn insert_enrollment(&self, e: &NewEnrollment) -> roster_core::Result<EnrollmentId> {
    self.run(|conn| {
      let id: i64 = conn.query_row(
        "INSERT INTO enrollments (student_id, course_name, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id",
        rusqlite::params![
          e.student_id.0,
          e.course_name,
          encode_date(e.start_date),
          encode_date(e.end_date),
        ],
        |row| row.get(0),
      )?;
      Ok(EnrollmentId(id))
    })
  }

  fn update_enrollment(
    &self,
    id: EnrollmentId,
    changes: &EnrollmentChanges,
  ) -> roster_core::Result<usize> {
    let start = changes.start_date.map(encode_date);
    let end = changes.end_date.map(encode_date);
    self.run(|conn| {
      Ok(conn.execute(
        "UPDATE enrollments SET
           course_name = ?3,
           start_date  = COALESCE(?4, start_date),
           end_date    = COALESCE(?5, end_date)
         WHERE id = ?1 AND student_id = ?2",
        rusqlite::params![id.0, changes.student_id.0, changes.course_name, start, end],
      )?)
    })
  }

  // ── Status events (append-only) ───────────────────────────────────────────

  fn fetch_latest_status_event(
    &self,
    enrollment: EnrollmentId,
  ) -> roster_core::Result<Option<StatusEvent>> {
    self.run(|conn| {
      let raw = conn
        .query_row(
          &format!(
            "SELECT {STATUS_EVENT_COLUMNS} FROM status_events
             WHERE enrollment_id = ?1
             ORDER BY id DESC
             LIMIT 1"
          ),
          rusqlite::params![enrollment.0],
          RawStatusEvent::from_row,
        )
        .optional()?;
      raw.map(RawStatusEvent::into_event).transpose()
    })
  }

  fn fetch_status_events(&self, enrollment: EnrollmentId) -> roster_core::Result<Vec<StatusEvent>> {
    self.run(|conn| {
      let mut stmt = conn.prepare(&format!(
        "SELECT {STATUS_EVENT_COLUMNS} FROM status_events WHERE enrollment_id = ?1 ORDER BY id"
      ))?;
      let raws = stmt
        .query_map(rusqlite::params![enrollment.0], RawStatusEvent::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      raws.into_iter().map(RawStatusEvent::into_event).collect()
    })
  }

  fn insert_status_event(
    &self,
    enrollment: EnrollmentId,
    status: &str,
  ) -> roster_core::Result<StatusEvent> {
    let recorded_at = Utc::now();
    self.run(|conn| {
      let id: i64 = conn.query_row(
        "INSERT INTO status_events (enrollment_id, status, recorded_at)
         VALUES (?1, ?2, ?3)
         RETURNING id",
        rusqlite::params![enrollment.0, status, encode_dt(recorded_at)],
        |row| row.get(0),
      )?;
      Ok(StatusEvent {
        id:            StatusEventId(id),
        enrollment_id: enrollment,
        status:        status.to_owned(),
        recorded_at,
      })
    })
  }
}
