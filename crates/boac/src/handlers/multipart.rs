//! Multipart form reading for note and template endpoints.
//!
//! Text fields are gathered into a JSON object so the form types in
//! `boac_core::note` can deserialize them; file fields whose name starts
//! with `attachment` become uploads.

use axum::extract::Multipart;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use boac_core::note::{NewAttachment, NoteError};
use boac_core::storage::{attachment_key, sanitize_filename};

use super::{ApiError, AppError};
use crate::state::AppState;

#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: Map<String, Value>,
    pub uploads: Vec<Upload>,
}

impl MultipartForm {
    /// Deserializes the text fields. Malformed values are a bad request.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| ApiError::bad_request(format!("Invalid form data: {e}")))
    }

    fn push_field(&mut self, name: &str, value: String) {
        let name = name.strip_suffix("[]").unwrap_or(name).to_string();
        match self.fields.get_mut(&name) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                self.fields.insert(name, Value::String(value));
            }
        }
    }
}

/// Reads a multipart body, enforcing the per-file limit.
pub async fn read_multipart(
    mut multipart: Multipart,
    max_bytes: usize,
    limit_mb: u64,
) -> Result<MultipartForm, AppError> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match file_name {
            Some(raw_name) if name.starts_with("attachment") => {
                let filename = sanitize_filename(&raw_name).ok_or(NoteError::AttachmentNameRequired)?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                if bytes.len() > max_bytes {
                    return Err(NoteError::AttachmentTooLarge { filename, limit_mb }.into());
                }
                form.uploads.push(Upload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                form.push_field(&name, text);
            }
        }
    }

    Ok(form)
}

/// Writes uploads to the attachment store, returning the rows to record.
pub async fn store_uploads(
    state: &AppState,
    uploads: Vec<Upload>,
    uploaded_by_uid: &str,
) -> Result<Vec<NewAttachment>, AppError> {
    let today = Utc::now().date_naive();
    let mut attachments = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let key = attachment_key(today, &Uuid::new_v4().simple().to_string(), &upload.filename);
        let path_to_attachment = match state.attachments.put(&key, upload.bytes).await {
            Ok(path) => path,
            Err(err) => {
                discard_uploads(state, &attachments).await;
                return Err(err.into());
            }
        };
        tracing::debug!(path = %path_to_attachment, uid = %uploaded_by_uid, "Stored upload");
        attachments.push(NewAttachment {
            path_to_attachment,
            filename: upload.filename,
            uploaded_by_uid: uploaded_by_uid.to_string(),
        });
    }
    Ok(attachments)
}

/// Removes blobs written by [`store_uploads`] when their rows were never
/// recorded. Failures are logged and otherwise ignored.
pub async fn discard_uploads(state: &AppState, uploads: &[NewAttachment]) {
    for upload in uploads {
        if let Err(err) = state.attachments.delete(&upload.path_to_attachment).await {
            tracing::warn!(path = %upload.path_to_attachment, error = %err, "Failed to remove upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repeated_fields_collect_into_arrays() {
        let mut form = MultipartForm::default();
        form.push_field("sids[]", "11667051".into());
        form.push_field("sids[]", "2345678901".into());
        form.push_field("sids[]", "3456789012".into());
        form.push_field("subject", "Hello".into());

        assert_eq!(
            Value::Object(form.fields),
            json!({
                "sids": ["11667051", "2345678901", "3456789012"],
                "subject": "Hello",
            })
        );
    }

    #[test]
    fn test_parse_reports_bad_request() {
        let mut form = MultipartForm::default();
        form.push_field("id", "twelve".into());

        let err = form
            .parse::<boac_core::note::UpdateNoteForm>()
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
