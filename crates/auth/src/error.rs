use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use boac_core::storage::RepositoryError;
use serde_json::json;
use thiserror::Error;

/// Auth errors for the boac_auth crate.
///
/// This wraps the core `AuthError` and adds the storage failures that
/// surface while resolving a session's user.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module.
    #[error(transparent)]
    Core(#[from] boac_core::auth::AuthError),

    /// User lookup failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        use boac_core::auth::AuthError as CoreError;

        match self {
            AuthError::Core(CoreError::InvalidCredentials | CoreError::NotAuthorized(_)) => {
                StatusCode::FORBIDDEN
            }
            AuthError::Core(CoreError::DevAuthDisabled) => StatusCode::NOT_FOUND,
            AuthError::Core(CoreError::SessionNotFound | CoreError::SessionExpired) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Core(CoreError::Storage(_)) | AuthError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!("Auth error: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boac_core::auth::AuthError as CoreError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (CoreError::InvalidCredentials, StatusCode::FORBIDDEN),
            (
                CoreError::NotAuthorized("2040".into()),
                StatusCode::FORBIDDEN,
            ),
            (CoreError::DevAuthDisabled, StatusCode::NOT_FOUND),
            (CoreError::SessionExpired, StatusCode::UNAUTHORIZED),
            (
                CoreError::Storage("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(AuthError::from(error).status_code(), expected);
        }
    }

    #[test]
    fn test_repository_error_is_internal() {
        let error = AuthError::from(RepositoryError::ConnectionFailed("gone".into()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
