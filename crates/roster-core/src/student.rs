//! Student: the enrollee at the root of every aggregate.
//!
//! A student row owns its enrollments. Soft-deleting a student only hides it
//! from default listings; the row and everything hanging off it stays in the
//! store for audit.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

/// Upper bound accepted for [`StudentProfile::age`].
pub const MAX_AGE: u8 = 120;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Store-generated identity of a student. Immutable once assigned.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StudentId(pub i64);

impl fmt::Display for StudentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Gender ──────────────────────────────────────────────────────────────────

/// The recognised gender values accepted by filtered search.
///
/// Stored student rows keep whatever text was submitted; this enum only
/// governs which search values are accepted and how they compare.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Gender {
  Male,
  Female,
  Other,
}

impl Gender {
  /// Parse a caller-supplied value, rejecting anything outside the
  /// recognised set.
  pub fn parse(value: &str) -> Result<Self> {
    value
      .trim()
      .parse()
      .map_err(|_| Error::invalid(format!("unrecognised gender: {value:?}")))
  }

  /// Case-insensitive comparison against a stored gender value.
  pub fn matches(self, stored: &str) -> bool {
    stored.trim().eq_ignore_ascii_case(&self.to_string())
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The caller-editable fields of a student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
  pub name:     String,
  /// Phonetic reading of `name`.
  pub furigana: Option<String>,
  pub nickname: Option<String>,
  pub email:    Option<String>,
  pub region:   Option<String>,
  pub age:      Option<u8>,
  pub gender:   Option<String>,
  /// Free-text remark.
  pub remark:   Option<String>,
}

impl StudentProfile {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Default::default() }
  }

  /// Structural checks performed before any write.
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::invalid("student name must not be blank"));
    }
    if let Some(age) = self.age
      && age > MAX_AGE
    {
      return Err(Error::invalid(format!(
        "age must be between 0 and {MAX_AGE}, got {age}"
      )));
    }
    if let Some(email) = &self.email
      && !email.contains('@')
    {
      return Err(Error::invalid(format!("malformed email address: {email:?}")));
    }
    Ok(())
  }
}

// ─── Student ─────────────────────────────────────────────────────────────────

/// A persisted student row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
  pub id:         StudentId,
  #[serde(flatten)]
  pub profile:    StudentProfile,
  /// Soft-delete flag.
  pub is_deleted: bool,
}

/// Input to a student-row update: the identity to address plus the new
/// profile. `is_deleted: None` leaves the soft-delete flag untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdate {
  pub id:         StudentId,
  #[serde(flatten)]
  pub profile:    StudentProfile,
  #[serde(default)]
  pub is_deleted: Option<bool>,
}
