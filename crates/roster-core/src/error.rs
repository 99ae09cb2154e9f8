//! Error types for `roster-core`.
//!
//! The taxonomy is shared by every layer: storage backends convert their own
//! failures into [`Error::Store`], and the HTTP layer maps each variant onto a
//! status code.

use thiserror::Error;

use crate::{enrollment::EnrollmentId, student::StudentId};

#[derive(Debug, Error)]
pub enum Error {
  /// The caller supplied structurally invalid input. Never retried.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("student not found: {0}")]
  StudentNotFound(StudentId),

  #[error("enrollment not found: {0}")]
  EnrollmentNotFound(EnrollmentId),

  /// An invariant this crate is responsible for did not hold, which points
  /// at an anomaly in the store.
  #[error("inconsistent state: {0}")]
  InconsistentState(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidArgument(message.into())
  }

  pub fn inconsistent(message: impl Into<String>) -> Self {
    Self::InconsistentState(message.into())
  }

  /// Wrap a backend failure, keeping it as the error source.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::StudentNotFound(_) | Self::EnrollmentNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
