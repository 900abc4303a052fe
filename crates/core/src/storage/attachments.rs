use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use super::Result;

/// Blob storage for note and template attachments.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Stores bytes under `key` and returns the path to record on the note.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String>;

    /// Reads a stored attachment. `None` when nothing is stored at `path`.
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Removes a stored attachment. Removing a missing path is not an error.
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Reduces an uploaded filename to its last path component.
/// Returns `None` when nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches('.');
    (!base.is_empty()).then(|| base.to_string())
}

/// Storage key for an attachment: `{YYYY}/{MM}/{DD}/{unique}_{filename}`.
pub fn attachment_key(date: NaiveDate, unique: &str, filename: &str) -> String {
    format!(
        "{:04}/{:02}/{:02}/{unique}_{filename}",
        date.year(),
        date.month(),
        date.day()
    )
}
