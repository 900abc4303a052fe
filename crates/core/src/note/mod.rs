//! Advising notes, their attachments and note templates.

mod error;
mod linkify;
mod requests;
mod template;
mod types;
mod view;

pub use error::NoteError;
pub use linkify::linkify;
pub use requests::{CreateNoteForm, CreateNoteTemplateForm, UpdateNoteForm};
pub use template::{NewNoteTemplate, NoteTemplate, NoteTemplateAttachment};
pub use types::{
    parse_contact_type, ContactType, NewAttachment, NewNote, Note, NoteAttachment, NoteAuthor,
    NoteDraft,
};
pub use view::{AttachmentView, AuthorView, DepartmentView, NoteTemplateView, NoteView};
