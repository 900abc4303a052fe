use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NewAttachment;

/// A reusable note skeleton owned by its creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteTemplate {
    pub id: i64,
    pub creator_id: i64,
    pub title: String,
    pub subject: String,
    pub body: String,
    pub topics: Vec<String>,
    pub is_private: bool,
    pub attachments: Vec<NoteTemplateAttachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NoteTemplate {
    pub fn is_created_by(&self, user_id: i64) -> bool {
        self.creator_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteTemplateAttachment {
    pub id: i64,
    pub note_template_id: i64,
    pub path_to_attachment: String,
    pub filename: String,
    pub uploaded_by_uid: String,
    pub created_at: DateTime<Utc>,
}

impl NoteTemplateAttachment {
    /// The same stored file, to be linked to a note.
    pub fn to_new_attachment(&self) -> NewAttachment {
        NewAttachment {
            path_to_attachment: self.path_to_attachment.clone(),
            filename: self.filename.clone(),
            uploaded_by_uid: self.uploaded_by_uid.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNoteTemplate {
    pub creator_id: i64,
    pub title: String,
    pub subject: String,
    pub body: String,
    pub topics: Vec<String>,
    pub is_private: bool,
    pub attachments: Vec<NewAttachment>,
}

impl NewNoteTemplate {
    pub fn into_template(
        self,
        id: i64,
        now: DateTime<Utc>,
        first_attachment_id: i64,
    ) -> NoteTemplate {
        let attachments = self
            .attachments
            .into_iter()
            .zip(first_attachment_id..)
            .map(|(a, attachment_id)| NoteTemplateAttachment {
                id: attachment_id,
                note_template_id: id,
                path_to_attachment: a.path_to_attachment,
                filename: a.filename,
                uploaded_by_uid: a.uploaded_by_uid,
                created_at: now,
            })
            .collect();
        NoteTemplate {
            id,
            creator_id: self.creator_id,
            title: self.title,
            subject: self.subject,
            body: self.body,
            topics: self.topics,
            is_private: self.is_private,
            attachments,
            created_at: now,
            updated_at: now,
        }
    }
}
