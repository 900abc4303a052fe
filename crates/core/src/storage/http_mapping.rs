//! Pure functions for mapping repository errors to HTTP status codes.
//!
//! Codes are plain `u16`; the server converts them to `StatusCode`.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `AlreadyExists` -> 409 (Conflict)
/// - `ConnectionFailed` -> 503 (Service Unavailable)
/// - `QueryFailed` -> 500 (Internal Server Error)
/// - `Serialization` -> 500 (Internal Server Error)
/// - `InvalidData` -> 400 (Bad Request)
///
/// # Examples
///
/// ```
/// use boac_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::NotFound {
///     entity_type: "Cohort",
///     id: "7".to_string(),
/// };
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_) => 500,
        RepositoryError::Serialization(_) => 500,
        RepositoryError::InvalidData(_) => 400,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let not_found = RepositoryError::NotFound {
            entity_type: "CuratedGroup",
            id: "3".to_string(),
        };
        let duplicate = RepositoryError::AlreadyExists {
            entity_type: "NoteTemplate",
            id: "Welcome".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&not_found), 404);
        assert_eq!(repository_error_to_status_code(&duplicate), 409);
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::ConnectionFailed(
                "database is locked".to_string()
            )),
            503
        );
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::QueryFailed(
                "near \"SELEC\": syntax error".to_string()
            )),
            500
        );
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::Serialization(
                "invalid criteria JSON".to_string()
            )),
            500
        );
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::InvalidData(
                "UNIQUE constraint failed".to_string()
            )),
            400
        );
    }
}
