use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::user::AuthorizedUser;

use super::NoteError;

/// How the advisor met with the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactType {
    #[serde(rename = "Email")]
    Email,
    #[serde(rename = "Phone")]
    Phone,
    #[serde(rename = "Online same day")]
    OnlineSameDay,
    #[serde(rename = "Online scheduled")]
    OnlineScheduled,
    #[serde(rename = "In-person same day")]
    InPersonSameDay,
    #[serde(rename = "In-person scheduled")]
    InPersonScheduled,
    #[serde(rename = "Admin")]
    Admin,
}

impl ContactType {
    pub const ALL: [ContactType; 7] = [
        ContactType::Email,
        ContactType::Phone,
        ContactType::OnlineSameDay,
        ContactType::OnlineScheduled,
        ContactType::InPersonSameDay,
        ContactType::InPersonScheduled,
        ContactType::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::Email => "Email",
            ContactType::Phone => "Phone",
            ContactType::OnlineSameDay => "Online same day",
            ContactType::OnlineScheduled => "Online scheduled",
            ContactType::InPersonSameDay => "In-person same day",
            ContactType::InPersonScheduled => "In-person scheduled",
            ContactType::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for ContactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContactType {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContactType::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| NoteError::InvalidContactType(s.to_string()))
    }
}

/// Parses an optional form value into a contact type. Blank means unset.
pub fn parse_contact_type(value: Option<&str>) -> Result<Option<ContactType>, NoteError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

/// A file attached to a note. Soft-deleted along with its note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteAttachment {
    pub id: i64,
    pub note_id: i64,
    /// Key in the attachment store.
    pub path_to_attachment: String,
    pub filename: String,
    pub uploaded_by_uid: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An attachment that has been stored but not yet linked to a note.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttachment {
    pub path_to_attachment: String,
    pub filename: String,
    pub uploaded_by_uid: String,
}

/// An advising note about one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub sid: String,
    pub author_uid: String,
    pub author_name: String,
    pub author_role: String,
    /// Department codes, or the directory affiliation, of the author when
    /// the note was written.
    pub author_dept_codes: Vec<String>,
    pub subject: String,
    pub body: String,
    pub topics: Vec<String>,
    pub attachments: Vec<NoteAttachment>,
    pub contact_type: Option<ContactType>,
    pub set_date: Option<NaiveDate>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Note {
    pub fn is_authored_by(&self, uid: &str) -> bool {
        self.author_uid == uid
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Attachments that have not been removed.
    pub fn live_attachments(&self) -> impl Iterator<Item = &NoteAttachment> {
        self.attachments.iter().filter(|a| a.deleted_at.is_none())
    }
}

/// Author details captured on every note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteAuthor {
    pub uid: String,
    pub name: String,
    pub role: String,
    pub dept_codes: Vec<String>,
}

impl NoteAuthor {
    /// Snapshot of a user as a note author. Directory title and affiliation
    /// win over department memberships.
    pub fn of(user: &AuthorizedUser) -> Self {
        let role = user
            .title
            .clone()
            .or_else(|| user.departments.first().map(|m| m.role.to_string()))
            .unwrap_or_else(|| "advisor".to_string());
        let dept_codes = match &user.dept_affiliation {
            Some(affiliation) => vec![affiliation.clone()],
            None => user.dept_codes(),
        };
        Self {
            uid: user.uid.clone(),
            name: user.name.clone(),
            role,
            dept_codes,
        }
    }
}

/// Content shared by every note created in one request.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub subject: String,
    pub body: String,
    pub topics: Vec<String>,
    pub contact_type: Option<ContactType>,
    pub set_date: Option<NaiveDate>,
    pub is_private: bool,
}

/// Data needed to insert a note. The store assigns ids and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub sid: String,
    pub author: NoteAuthor,
    pub draft: NoteDraft,
    pub attachments: Vec<NewAttachment>,
}

impl NewNote {
    pub fn into_note(self, id: i64, now: DateTime<Utc>, first_attachment_id: i64) -> Note {
        let attachments = self
            .attachments
            .into_iter()
            .zip(first_attachment_id..)
            .map(|(a, attachment_id)| a.into_attachment(attachment_id, id, now))
            .collect();
        Note {
            id,
            sid: self.sid,
            author_uid: self.author.uid,
            author_name: self.author.name,
            author_role: self.author.role,
            author_dept_codes: self.author.dept_codes,
            subject: self.draft.subject,
            body: self.draft.body,
            topics: self.draft.topics,
            attachments,
            contact_type: self.draft.contact_type,
            set_date: self.draft.set_date,
            is_private: self.draft.is_private,
            created_at: now,
            updated_at: None,
            deleted_at: None,
        }
    }
}

impl NewAttachment {
    pub fn into_attachment(self, id: i64, note_id: i64, now: DateTime<Utc>) -> NoteAttachment {
        NoteAttachment {
            id,
            note_id,
            path_to_attachment: self.path_to_attachment,
            filename: self.filename,
            uploaded_by_uid: self.uploaded_by_uid,
            created_at: now,
            deleted_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{DeptMembership, DeptRole, NewUser};

    #[test]
    fn test_contact_type_parse() {
        assert_eq!(
            "In-person same day".parse::<ContactType>(),
            Ok(ContactType::InPersonSameDay)
        );
        assert_eq!(
            "Bope".parse::<ContactType>(),
            Err(NoteError::InvalidContactType("Bope".into()))
        );
        assert_eq!(parse_contact_type(Some("  ")), Ok(None));
    }

    #[test]
    fn test_contact_type_serializes_as_label() {
        let json = serde_json::to_string(&ContactType::OnlineSameDay).unwrap();
        assert_eq!(json, r#""Online same day""#);
    }

    #[test]
    fn test_author_prefers_directory_title_and_affiliation() {
        let user = NewUser::new("242881", "Paul Kerschen")
            .with_title("Harmless Drudge")
            .with_dept_affiliation("Department of English")
            .with_membership(DeptMembership::new("QCADVMAJ", DeptRole::Advisor))
            .into_user(1, Utc::now());

        let author = NoteAuthor::of(&user);
        assert_eq!(author.role, "Harmless Drudge");
        assert_eq!(author.dept_codes, vec!["Department of English"]);
    }

    #[test]
    fn test_author_falls_back_to_membership() {
        let user = NewUser::new("1133399", "Roberta Joan Anderson")
            .with_membership(DeptMembership::new("COENG", DeptRole::Advisor))
            .into_user(1, Utc::now());

        let author = NoteAuthor::of(&user);
        assert_eq!(author.role, "advisor");
        assert_eq!(author.dept_codes, vec!["COENG"]);
    }
}
