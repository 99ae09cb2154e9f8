//! Core types and the consistency engine for the Roster enrollment store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::Repository`] and
//! [`store::EntityStore`]; the engine functions run against a repository
//! bound to one transaction, and [`Roster`] wraps each of them in a unit of
//! work.

pub mod detail;
pub mod enrollment;
pub mod error;
pub mod registration;
pub mod roster;
pub mod search;
pub mod status;
pub mod store;
pub mod student;
pub mod update;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use roster::Roster;
