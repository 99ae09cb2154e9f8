//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by a [`Roster`] over any
//! [`roster_core::store::EntityStore`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(roster_api::api_router(roster.clone()))
//! ```

pub mod enrollments;
pub mod error;
pub mod extract;
pub mod students;

use std::sync::Arc;

use axum::{Router, routing::get};
use roster_core::{Roster, store::EntityStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `roster`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: EntityStore>(roster: Arc<Roster<S>>) -> Router<()> {
  Router::new()
    // Students
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route("/students/search", get(students::search::<S>))
    .route(
      "/students/{id}",
      get(students::get_one::<S>)
        .put(students::replace::<S>)
        .patch(students::patch::<S>)
        .delete(students::delete::<S>),
    )
    // Status history
    .route(
      "/enrollments/{id}/statuses",
      get(enrollments::history::<S>).post(enrollments::record::<S>),
    )
    .with_state(roster)
}
