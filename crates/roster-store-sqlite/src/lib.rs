//! SQLite backend for the Roster enrollment store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every unit of work handed to
//! the [`EntityStore`](roster_core::store::EntityStore) runs inside one
//! SQLite transaction.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SqliteRepository, SqliteStore};
