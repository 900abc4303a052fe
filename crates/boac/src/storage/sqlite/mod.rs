//! SQLite storage backend.
//!
//! Implements the repository traits with `rusqlite`, wrapped for async use
//! by `tokio-rusqlite`. Enabled with the `sqlite` feature.

mod conversions;
mod error;
mod repository;
mod schema;

pub use repository::SqliteRepository;
