//! SQLite backend for the Lectern platform store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The invitation-acceptance and
//! one-time-token writes are conditional updates inside transactions; see
//! [`store`] for the compare-and-set details.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
