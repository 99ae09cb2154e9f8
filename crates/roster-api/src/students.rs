//! Handlers for `/students` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/students` | Every student that is not soft-deleted |
//! | `GET`    | `/students/search` | Exactly one of `?id`, `?gender`, `?courseName` |
//! | `GET`    | `/students/:id` | 404 if unknown; soft-deleted students included |
//! | `POST`   | `/students` | Body: [`Registration`]; returns 201 + detail |
//! | `PUT`    | `/students/:id` | Body: [`DetailUpdate`]; returns the updated detail |
//! | `PATCH`  | `/students/:id` | Body: [`PatchBody`]; student row only |
//! | `DELETE` | `/students/:id` | Soft delete; 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  Roster,
  detail::StudentDetail,
  registration::Registration,
  search::SearchParams,
  store::EntityStore,
  student::{Student, StudentId, StudentProfile, StudentUpdate},
  update::DetailUpdate,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{JsonBody, PathParam, QueryParams},
};

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /students`
pub async fn list<S: EntityStore>(
  State(roster): State<Arc<Roster<S>>>,
) -> Result<Json<Vec<StudentDetail>>, ApiError> {
  Ok(Json(roster.search_all().await?))
}

/// `GET /students/search?gender=female`
pub async fn search<S: EntityStore>(
  State(roster): State<Arc<Roster<S>>>,
  QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<Vec<StudentDetail>>, ApiError> {
  Ok(Json(roster.search_by_filter(params).await?))
}

/// `GET /students/:id`
pub async fn get_one<S: EntityStore>(
  State(roster): State<Arc<Roster<S>>>,
  PathParam(id): PathParam<StudentId>,
) -> Result<Json<StudentDetail>, ApiError> {
  let detail = roster
    .search_by_identity(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(detail))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /students`
pub async fn create<S: EntityStore>(
  State(roster): State<Arc<Roster<S>>>,
  JsonBody(body): JsonBody<Registration>,
) -> Result<impl IntoResponse, ApiError> {
  let detail = roster.register(body).await?;
  Ok((StatusCode::CREATED, Json(detail)))
}

/// `PUT /students/:id`. The body's student must carry the same `id`.
pub async fn replace<S: EntityStore>(
  State(roster): State<Arc<Roster<S>>>,
  PathParam(id): PathParam<StudentId>,
  JsonBody(body): JsonBody<DetailUpdate>,
) -> Result<Json<StudentDetail>, ApiError> {
  if let Some(student) = &body.student
    && student.id != id
  {
    return Err(ApiError::BadRequest(format!(
      "path id {id} does not match body id {}",
      student.id
    )));
  }
  Ok(Json(roster.update_with_courses(body).await?))
}

/// Body of `PATCH /students/:id`: the full profile, plus an optional
/// soft-delete flag.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchBody {
  #[serde(flatten)]
  pub profile:    StudentProfile,
  #[serde(default)]
  pub is_deleted: Option<bool>,
}

/// `PATCH /students/:id`
pub async fn patch<S: EntityStore>(
  State(roster): State<Arc<Roster<S>>>,
  PathParam(id): PathParam<StudentId>,
  JsonBody(body): JsonBody<PatchBody>,
) -> Result<Json<Student>, ApiError> {
  let update = StudentUpdate { id, profile: body.profile, is_deleted: body.is_deleted };
  Ok(Json(roster.update_student(update).await?))
}

/// `DELETE /students/:id`
pub async fn delete<S: EntityStore>(
  State(roster): State<Arc<Roster<S>>>,
  PathParam(id): PathParam<StudentId>,
) -> Result<StatusCode, ApiError> {
  roster.soft_delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
