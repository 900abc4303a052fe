//! In-memory storage backend.
//!
//! Stores everything in ordered maps wrapped in `Arc<RwLock<_>>`. Used by the
//! default `inmemory` feature and by handler tests.

mod repository;

pub use repository::InMemoryRepository;
