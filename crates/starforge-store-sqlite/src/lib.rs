//! SQLite backend for the starforge galaxy generator.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::TABLES;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
