use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("dev auth is disabled")]
    DevAuthDisabled,

    #[error("user is not authorized to use BOAC: {0}")]
    NotAuthorized(String),

    #[error("session not found")]
    SessionNotFound,

    #[error("session expired")]
    SessionExpired,

    #[error("storage error: {0}")]
    Storage(String),
}
