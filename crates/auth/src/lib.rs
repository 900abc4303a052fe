//! Session authentication for BOAC.
//!
//! This crate provides:
//! - Session storage (in-memory, or SQLite with the `sqlite` feature)
//! - Axum extractors for the signed-in user
//! - Development login and logout routes

mod config;
mod error;
mod extractors;
mod handlers;
mod sessions;
mod state;

pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::{AuthRejection, CurrentUser, OptionalUser};
pub use handlers::{auth_routes, is_boac_user};
pub use sessions::SessionStore;
#[cfg(feature = "sqlite")]
pub use sessions::SqliteSessionStore;
pub use state::AuthState;
