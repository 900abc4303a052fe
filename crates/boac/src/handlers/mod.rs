pub mod authz;
pub mod cohorts;
pub mod curated;
pub mod error;
pub mod frontend;
pub mod health;
mod multipart;
pub mod note_templates;
pub mod notes;
pub mod profile;
pub mod students;
pub mod topics;

pub use error::{json_body, ApiError, AppError};
