mod attachments;
mod error;
mod http_mapping;
mod traits;

pub use attachments::{attachment_key, sanitize_filename, AttachmentStore};
pub use error::{RepositoryError, Result};
pub use http_mapping::repository_error_to_status_code;
pub use traits::{
    AppointmentRepository, CohortRepository, CuratedGroupRepository, NoteRepository,
    NoteTemplateRepository, StudentRepository, TopicRepository, UserRepository,
};
