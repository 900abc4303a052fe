use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let cases = [
            (
                RepositoryError::NotFound {
                    entity_type: "Note",
                    id: "42".to_string(),
                },
                "Note not found: 42",
            ),
            (
                RepositoryError::AlreadyExists {
                    entity_type: "Topic",
                    id: "Study Skills".to_string(),
                },
                "Topic already exists: Study Skills",
            ),
            (
                RepositoryError::ConnectionFailed("unable to open database file".to_string()),
                "Connection failed: unable to open database file",
            ),
            (
                RepositoryError::QueryFailed("no such column: s.gpa".to_string()),
                "Query failed: no such column: s.gpa",
            ),
            (
                RepositoryError::Serialization("invalid criteria JSON".to_string()),
                "Serialization error: invalid criteria JSON",
            ),
            (
                RepositoryError::InvalidData("FOREIGN KEY constraint failed".to_string()),
                "Invalid data: FOREIGN KEY constraint failed",
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }
}
