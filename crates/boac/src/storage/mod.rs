//! Storage backend implementations.
//!
//! Concrete implementations of the repository traits defined in
//! `boac_core::storage`, selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): ordered maps behind `tokio::sync::RwLock`
//! - `sqlite`: SQLite storage backend using `rusqlite` and `tokio-rusqlite`
//!
//! The backend features are mutually exclusive; `state.rs` enforces this.
//!
//! Build with SQLite:
//! ```bash
//! cargo build -p boac --no-default-features --features sqlite
//! ```

mod attachments;

#[cfg(any(feature = "inmemory", test))]
pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use attachments::FsAttachmentStore;
#[cfg(test)]
pub use attachments::InMemoryAttachmentStore;

#[cfg(any(feature = "inmemory", test))]
pub use inmemory::InMemoryRepository;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepository;
