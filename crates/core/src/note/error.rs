use thiserror::Error;

/// Validation errors raised while building or changing a note or template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NoteError {
    #[error("Note creation requires a subject")]
    SubjectRequired,
    #[error("Note creation requires one or more SIDs, cohorts or curated groups")]
    NoRecipients,
    #[error("Invalid contact type: {0}")]
    InvalidContactType(String),
    #[error("Invalid set date: {0}")]
    InvalidSetDate(String),
    #[error("Note template requires a title")]
    TitleRequired,
    #[error("Note template requires a subject")]
    TemplateSubjectRequired,
    #[error("You have an existing template named '{0}'")]
    DuplicateTemplateTitle(String),
    #[error("Attachment {0} is not one of your template attachments")]
    ForeignTemplateAttachment(i64),
    #[error("Attachment '{filename}' exceeds the {limit_mb} MB limit")]
    AttachmentTooLarge { filename: String, limit_mb: u64 },
    #[error("Attachment filename is required")]
    AttachmentNameRequired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            NoteError::InvalidContactType("Bope".into()).to_string(),
            "Invalid contact type: Bope"
        );
        assert_eq!(
            NoteError::AttachmentTooLarge {
                filename: "big.pdf".into(),
                limit_mb: 20
            }
            .to_string(),
            "Attachment 'big.pdf' exceeds the 20 MB limit"
        );
    }
}
