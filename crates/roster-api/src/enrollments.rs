//! Handlers for `/enrollments/:id/statuses`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/enrollments/:id/statuses` | Full history, oldest first |
//! | `POST` | `/enrollments/:id/statuses` | Body: `{"status":"confirmed"}`; returns 201 + event |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  Roster,
  enrollment::EnrollmentId,
  status::StatusEvent,
  store::EntityStore,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{JsonBody, PathParam},
};

/// `GET /enrollments/:id/statuses`
pub async fn history<S: EntityStore>(
  State(roster): State<Arc<Roster<S>>>,
  PathParam(id): PathParam<EnrollmentId>,
) -> Result<Json<Vec<StatusEvent>>, ApiError> {
  Ok(Json(roster.status_history(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub status: String,
}

/// `POST /enrollments/:id/statuses`
pub async fn record<S: EntityStore>(
  State(roster): State<Arc<Roster<S>>>,
  PathParam(id): PathParam<EnrollmentId>,
  JsonBody(body): JsonBody<RecordBody>,
) -> Result<impl IntoResponse, ApiError> {
  let event = roster.record_status(id, body.status).await?;
  Ok((StatusCode::CREATED, Json(event)))
}
