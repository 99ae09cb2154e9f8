//! [`Roster`]: the async facade the HTTP layer talks to.
//!
//! Each method opens exactly one unit of work on the underlying
//! [`EntityStore`]: reads run in a read transaction, registrations and
//! updates in a single write transaction that commits only on success.

use chrono::NaiveDate;

use crate::{
  Result,
  detail::{self, StudentDetail},
  enrollment::EnrollmentId,
  registration::{self, Registration},
  search::{self, SearchFilter, SearchParams},
  status::{self, StatusEvent},
  store::EntityStore,
  student::{Student, StudentId, StudentUpdate},
  update::{self, DetailUpdate},
};

fn local_today() -> NaiveDate { chrono::Local::now().date_naive() }

pub struct Roster<S> {
  store: S,
  today: fn() -> NaiveDate,
}

impl<S: EntityStore> Roster<S> {
  pub fn new(store: S) -> Self { Self::with_clock(store, local_today) }

  /// Use `today` instead of the local calendar date when stamping new
  /// enrollments.
  pub fn with_clock(store: S, today: fn() -> NaiveDate) -> Self {
    Self { store, today }
  }

  pub fn store(&self) -> &S { &self.store }

  // ── Reads ─────────────────────────────────────────────────────────────

  #[tracing::instrument(skip(self))]
  pub async fn search_all(&self) -> Result<Vec<StudentDetail>> {
    self.store.read(search::search_all).await
  }

  #[tracing::instrument(skip(self))]
  pub async fn search_by_identity(&self, id: StudentId) -> Result<Option<StudentDetail>> {
    self
      .store
      .read(move |repo| search::search_by_identity(repo, id))
      .await
  }

  /// Validate `params` into a single filter and apply it.
  #[tracing::instrument(skip(self))]
  pub async fn search_by_filter(&self, params: SearchParams) -> Result<Vec<StudentDetail>> {
    let filter = SearchFilter::try_from(params)?;
    self
      .store
      .read(move |repo| search::search_by_filter(repo, &filter))
      .await
  }

  #[tracing::instrument(skip(self))]
  pub async fn status_history(&self, enrollment: EnrollmentId) -> Result<Vec<StatusEvent>> {
    self
      .store
      .read(move |repo| status::history(repo, enrollment))
      .await
  }

  // ── Writes ────────────────────────────────────────────────────────────

  #[tracing::instrument(skip_all)]
  pub async fn register(&self, registration: Registration) -> Result<StudentDetail> {
    let today = (self.today)();
    self
      .store
      .write(move |repo| registration::register(repo, registration, today))
      .await
  }

  /// Update a student with its courses and return the re-assembled detail,
  /// read back inside the same transaction.
  #[tracing::instrument(skip_all)]
  pub async fn update_with_courses(&self, update: DetailUpdate) -> Result<StudentDetail> {
    let today = (self.today)();
    self
      .store
      .write(move |repo| {
        let id = update
          .student
          .as_ref()
          .map(|s| s.id)
          .ok_or_else(|| crate::Error::invalid("update requires a student"))?;
        update::update_with_courses(repo, update, today)?;
        detail::assemble(repo, id)
      })
      .await
  }

  #[tracing::instrument(skip_all, fields(id = %update.id))]
  pub async fn update_student(&self, update: StudentUpdate) -> Result<Student> {
    self
      .store
      .write(move |repo| update::update_student(repo, &update))
      .await
  }

  #[tracing::instrument(skip(self))]
  pub async fn soft_delete(&self, id: StudentId) -> Result<()> {
    self.store.write(move |repo| update::soft_delete(repo, id)).await
  }

  #[tracing::instrument(skip(self))]
  pub async fn record_status(
    &self,
    enrollment: EnrollmentId,
    status: String,
  ) -> Result<StatusEvent> {
    self
      .store
      .write(move |repo| status::record(repo, enrollment, &status))
      .await
  }
}
