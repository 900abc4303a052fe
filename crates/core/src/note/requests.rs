//! Form payloads for note and template endpoints.
//!
//! The server collects multipart text fields into a JSON object and
//! deserializes it into these types, so every field tolerates string input.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::serde::{
    deserialize_form_bool, deserialize_form_id, deserialize_id_list, deserialize_optional_date,
    deserialize_optional_string, deserialize_string_list,
};

use super::{linkify, parse_contact_type, NoteDraft, NoteError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteForm {
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub sids: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub cohort_ids: Vec<i64>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub curated_group_ids: Vec<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub contact_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub set_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_form_bool")]
    pub is_private: bool,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub template_attachment_ids: Vec<i64>,
}

impl CreateNoteForm {
    pub fn has_recipients(&self) -> bool {
        !(self.sids.is_empty() && self.cohort_ids.is_empty() && self.curated_group_ids.is_empty())
    }

    pub fn draft(&self) -> Result<NoteDraft, NoteError> {
        build_draft(
            self.subject.as_deref(),
            self.body.as_deref(),
            &self.topics,
            self.contact_type.as_deref(),
            self.set_date,
            self.is_private,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteForm {
    #[serde(deserialize_with = "deserialize_form_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub contact_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub set_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_form_bool")]
    pub is_private: bool,
}

impl UpdateNoteForm {
    pub fn draft(&self) -> Result<NoteDraft, NoteError> {
        build_draft(
            self.subject.as_deref(),
            self.body.as_deref(),
            &self.topics,
            self.contact_type.as_deref(),
            self.set_date,
            self.is_private,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteTemplateForm {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_form_bool")]
    pub is_private: bool,
}

impl CreateNoteTemplateForm {
    /// Validated title and the note content it carries.
    pub fn validate(&self) -> Result<(String, NoteDraft), NoteError> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .ok_or(NoteError::TitleRequired)?;
        let draft = build_draft(
            self.subject.as_deref(),
            self.body.as_deref(),
            &self.topics,
            None,
            None,
            self.is_private,
        )
        .map_err(|e| match e {
            NoteError::SubjectRequired => NoteError::TemplateSubjectRequired,
            other => other,
        })?;
        Ok((title.to_string(), draft))
    }
}

fn build_draft(
    subject: Option<&str>,
    body: Option<&str>,
    topics: &[String],
    contact_type: Option<&str>,
    set_date: Option<NaiveDate>,
    is_private: bool,
) -> Result<NoteDraft, NoteError> {
    let subject = subject.map(str::trim).ok_or(NoteError::SubjectRequired)?;
    let mut unique_topics: Vec<String> = Vec::with_capacity(topics.len());
    for topic in topics {
        if !unique_topics.iter().any(|t| t.eq_ignore_ascii_case(topic)) {
            unique_topics.push(topic.clone());
        }
    }
    Ok(NoteDraft {
        subject: subject.to_string(),
        body: linkify(body.map(str::trim).unwrap_or_default()),
        topics: unique_topics,
        contact_type: parse_contact_type(contact_type)?,
        set_date,
        is_private,
    })
}
