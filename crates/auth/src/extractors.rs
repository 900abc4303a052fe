//! Axum extractors for authentication.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use boac_core::auth::{is_session_expired, AuthError as CoreError, SessionId};
use boac_core::user::AuthorizedUser;
use chrono::Utc;
use serde_json::json;

use crate::{AuthError, AuthState};

/// Extractor for the signed-in user. Rejects with 401 if not authenticated.
pub struct CurrentUser(pub AuthorizedUser);

/// Extractor for an optionally signed-in user. Never rejects on a missing or
/// stale session.
pub struct OptionalUser(pub Option<AuthorizedUser>);

/// Rejection returned when a request requires a signed-in user.
#[derive(Debug)]
pub enum AuthRejection {
    LoginRequired,
    Failed(AuthError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::LoginRequired => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "data": { "login_required": true },
                    "message": "Unauthorized",
                })),
            )
                .into_response(),
            AuthRejection::Failed(err) => err.into_response(),
        }
    }
}

/// Session id from a `Bearer` header (API clients) or the session cookie.
pub(crate) fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| SessionId::new(token.trim().to_string()));

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(cookie_name)
            .map(|cookie| SessionId::new(cookie.value().to_string()))
    })
}

/// Resolves a session id to its user.
async fn session_user(
    auth_state: &AuthState,
    session_id: &SessionId,
) -> Result<AuthorizedUser, AuthError> {
    let session = auth_state
        .sessions
        .get_session(session_id)
        .await?
        .ok_or(CoreError::SessionNotFound)?;

    if is_session_expired(&session, Utc::now()) {
        return Err(CoreError::SessionExpired.into());
    }

    auth_state
        .users
        .get_user_by_uid(&session.uid)
        .await?
        .ok_or_else(|| CoreError::NotAuthorized(session.uid.clone()).into())
}

fn is_stale_session(err: &AuthError) -> bool {
    matches!(
        err,
        AuthError::Core(
            CoreError::SessionNotFound | CoreError::SessionExpired | CoreError::NotAuthorized(_)
        )
    )
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let session_id = session_id_from_headers(&parts.headers, &auth_state.config.cookie_name)
            .ok_or(AuthRejection::LoginRequired)?;

        match session_user(&auth_state, &session_id).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(err) if is_stale_session(&err) => {
                tracing::debug!(error = %err, "Rejected session");
                Err(AuthRejection::LoginRequired)
            }
            Err(err) => Err(AuthRejection::Failed(err)),
        }
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let Some(session_id) =
            session_id_from_headers(&parts.headers, &auth_state.config.cookie_name)
        else {
            return Ok(OptionalUser(None));
        };

        match session_user(&auth_state, &session_id).await {
            Ok(user) => Ok(OptionalUser(Some(user))),
            Err(err) if is_stale_session(&err) => Ok(OptionalUser(None)),
            Err(err) => Err(AuthRejection::Failed(err)),
        }
    }
}
