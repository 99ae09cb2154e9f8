//! Filtered search over assembled student details.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  detail::{self, StudentDetail},
  store::Repository,
  student::{Gender, StudentId},
};

/// Raw search parameters as they arrive from a caller. Blank strings count
/// as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
  pub id:          Option<StudentId>,
  pub gender:      Option<String>,
  pub course_name: Option<String>,
}

/// A single validated search predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
  /// Exact identity. Matches soft-deleted students too.
  Id(StudentId),
  Gender(Gender),
  /// Case-sensitive substring of any enrolled course name.
  CourseName(String),
}

impl TryFrom<SearchParams> for SearchFilter {
  type Error = Error;

  fn try_from(params: SearchParams) -> Result<Self> {
    let gender = non_blank(params.gender);
    let course_name = non_blank(params.course_name);

    let supplied = [params.id.is_some(), gender.is_some(), course_name.is_some()]
      .into_iter()
      .filter(|s| *s)
      .count();
    if supplied == 0 {
      return Err(Error::invalid("at least one filter required"));
    }
    if supplied > 1 {
      return Err(Error::invalid("only one of id, gender or courseName may be given"));
    }

    if let Some(id) = params.id {
      Ok(Self::Id(id))
    } else if let Some(gender) = gender {
      Ok(Self::Gender(Gender::parse(&gender)?))
    } else {
      Ok(Self::CourseName(course_name.unwrap_or_default()))
    }
  }
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

/// Every student that is not soft-deleted.
pub fn search_all(repo: &dyn Repository) -> Result<Vec<StudentDetail>> {
  detail::assemble_all(repo, false, |_| true)
}

/// Look a student up by identity. `None` means no such student; deleted
/// students are returned.
pub fn search_by_identity(
  repo: &dyn Repository,
  id: StudentId,
) -> Result<Option<StudentDetail>> {
  match detail::assemble(repo, id) {
    Ok(detail) => Ok(Some(detail)),
    Err(Error::StudentNotFound(_)) => Ok(None),
    Err(e) => Err(e),
  }
}

/// Apply one filter. No match yields an empty list.
pub fn search_by_filter(
  repo: &dyn Repository,
  filter: &SearchFilter,
) -> Result<Vec<StudentDetail>> {
  match filter {
    SearchFilter::Id(id) => Ok(search_by_identity(repo, *id)?.into_iter().collect()),
    SearchFilter::Gender(gender) => detail::assemble_all(repo, false, |d| {
      d.student
        .profile
        .gender
        .as_deref()
        .is_some_and(|stored| gender.matches(stored))
    }),
    SearchFilter::CourseName(needle) => detail::assemble_all(repo, false, |d| {
      d.enrollments.iter().any(|e| e.course_name.contains(needle.as_str()))
    }),
  }
}
