//! JSON shapes returned to API clients.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::user::dept_name;

use super::{Note, NoteAttachment, NoteTemplate, NoteTemplateAttachment};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DepartmentView {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthorView {
    pub uid: String,
    pub name: String,
    pub role: String,
    pub departments: Vec<DepartmentView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentView {
    pub id: i64,
    pub filename: String,
    pub note_id: i64,
    pub uploaded_by: String,
}

impl From<&NoteAttachment> for AttachmentView {
    fn from(attachment: &NoteAttachment) -> Self {
        Self {
            id: attachment.id,
            filename: attachment.filename.clone(),
            note_id: attachment.note_id,
            uploaded_by: attachment.uploaded_by_uid.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: i64,
    pub sid: String,
    #[serde(rename = "type")]
    pub note_type: &'static str,
    pub author: AuthorView,
    pub subject: String,
    pub body: Option<String>,
    pub message: Option<String>,
    pub topics: Vec<String>,
    pub attachments: Vec<AttachmentView>,
    pub contact_type: Option<String>,
    pub set_date: Option<String>,
    pub is_private: bool,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NoteView {
    /// Renders a note for a viewer. Private notes keep subject and author
    /// but drop body and attachments unless `can_see_private` is set.
    pub fn new(note: &Note, can_see_private: bool, read: bool) -> Self {
        let redacted = note.is_private && !can_see_private;
        let body = (!redacted).then(|| note.body.clone());
        let attachments = if redacted {
            Vec::new()
        } else {
            note.live_attachments().map(AttachmentView::from).collect()
        };
        let departments = note
            .author_dept_codes
            .iter()
            .map(|code| DepartmentView {
                name: dept_name(code).map(str::to_string).unwrap_or_else(|| code.clone()),
            })
            .collect();

        Self {
            id: note.id,
            sid: note.sid.clone(),
            note_type: "note",
            author: AuthorView {
                uid: note.author_uid.clone(),
                name: note.author_name.clone(),
                role: note.author_role.clone(),
                departments,
            },
            subject: note.subject.clone(),
            message: body.clone(),
            body,
            topics: note.topics.clone(),
            attachments,
            contact_type: note.contact_type.map(|c| c.to_string()),
            set_date: note.set_date.map(|d| d.format("%Y-%m-%d").to_string()),
            is_private: note.is_private,
            read,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateAttachmentView {
    pub id: i64,
    pub filename: String,
    pub note_template_id: i64,
    pub uploaded_by: String,
}

impl From<&NoteTemplateAttachment> for TemplateAttachmentView {
    fn from(attachment: &NoteTemplateAttachment) -> Self {
        Self {
            id: attachment.id,
            filename: attachment.filename.clone(),
            note_template_id: attachment.note_template_id,
            uploaded_by: attachment.uploaded_by_uid.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteTemplateView {
    pub id: i64,
    pub title: String,
    pub subject: String,
    pub body: String,
    pub topics: Vec<String>,
    pub is_private: bool,
    pub attachments: Vec<TemplateAttachmentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&NoteTemplate> for NoteTemplateView {
    fn from(template: &NoteTemplate) -> Self {
        Self {
            id: template.id,
            title: template.title.clone(),
            subject: template.subject.clone(),
            body: template.body.clone(),
            topics: template.topics.clone(),
            is_private: template.is_private,
            attachments: template
                .attachments
                .iter()
                .map(TemplateAttachmentView::from)
                .collect(),
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}
