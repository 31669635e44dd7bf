//! SQLite backend for the Vigil presence store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Because every statement for one
//! store goes through a single connection thread, multi-step operations
//! expressed as one `call` closure (notably the case registry's
//! check-and-insert) are atomic with respect to each other.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
