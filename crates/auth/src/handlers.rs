//! HTTP handlers for auth routes.

use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use boac_core::auth::{calculate_expiry, generate_session_id, AuthError as CoreError, Session};
use boac_core::user::{AuthorizedUser, UserProfile};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AuthError;
use crate::extractors::{session_id_from_headers, OptionalUser};
use crate::AuthState;

#[derive(Debug, Deserialize)]
pub struct DevAuthLogin {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub password: String,
}

/// Creates the auth router for any parent state that can produce an
/// [`AuthState`].
///
/// Routes:
/// - `POST /auth/dev_auth_login` - Sign in by UID with the shared dev password
/// - `POST /auth/logout` - End current session
pub fn auth_routes<S>() -> Router<S>
where
    AuthState: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/auth/dev_auth_login", post(dev_auth_login))
        .route("/auth/logout", post(logout))
}

/// Whether a registered user may sign in: admins, and members of at least
/// one department.
pub fn is_boac_user(user: &AuthorizedUser) -> bool {
    user.is_admin || !user.departments.is_empty()
}

async fn dev_auth_login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(credentials): Json<DevAuthLogin>,
) -> Result<(CookieJar, Json<UserProfile>), AuthError> {
    if !state.config.dev_auth_enabled {
        return Err(CoreError::DevAuthDisabled.into());
    }
    let uid = credentials.uid.trim();
    let password_ok = state
        .config
        .dev_auth_password
        .as_deref()
        .is_some_and(|expected| expected == credentials.password);
    if uid.is_empty() || !password_ok {
        tracing::warn!(uid, "Dev auth login with invalid credentials");
        return Err(CoreError::InvalidCredentials.into());
    }

    let user = state
        .users
        .get_user_by_uid(uid)
        .await?
        .filter(is_boac_user)
        .ok_or_else(|| {
            tracing::warn!(uid, "Dev auth login by unauthorized user");
            CoreError::NotAuthorized(uid.to_string())
        })?;

    let now = Utc::now();
    let session = Session {
        id: generate_session_id(),
        uid: user.uid.clone(),
        created_at: now,
        expires_at: calculate_expiry(now, Duration::seconds(state.config.session_ttl_seconds())),
    };
    state.sessions.create_session(&session).await?;
    tracing::info!(uid = %user.uid, "User logged in");

    let cookie = Cookie::build((state.config.cookie_name.clone(), session.id.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.config.session_ttl_seconds()))
        .build();

    Ok((jar.add(cookie), Json(UserProfile::from(&user))))
}

async fn logout(
    State(state): State<AuthState>,
    OptionalUser(user): OptionalUser,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
) -> Result<(CookieJar, Json<Value>), AuthError> {
    if let Some(session_id) = session_id_from_headers(&headers, &state.config.cookie_name) {
        state.sessions.delete_session(&session_id).await?;
    }
    if let Some(user) = user {
        tracing::info!(uid = %user.uid, "User logged out");
    }

    let jar = jar.remove(Cookie::from(state.config.cookie_name.clone()));
    Ok((jar, Json(json!({ "isAnonymous": true }))))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use boac_core::storage::{Result as RepoResult, UserRepository};
    use boac_core::user::{DeptMembership, DeptRole, NewUser};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::{AuthConfig, SessionStore};

    struct StaticUsers(Vec<AuthorizedUser>);

    #[async_trait]
    impl UserRepository for StaticUsers {
        async fn get_user(&self, id: i64) -> RepoResult<Option<AuthorizedUser>> {
            Ok(self.0.iter().find(|u| u.id == id).cloned())
        }

        async fn get_user_by_uid(&self, uid: &str) -> RepoResult<Option<AuthorizedUser>> {
            Ok(self.0.iter().find(|u| u.uid == uid).cloned())
        }

        async fn list_users(&self) -> RepoResult<Vec<AuthorizedUser>> {
            Ok(self.0.clone())
        }

        async fn create_user(&self, user: NewUser) -> RepoResult<AuthorizedUser> {
            Ok(user.into_user(99, Utc::now()))
        }
    }

    fn app(config: AuthConfig) -> Router {
        let users = StaticUsers(vec![
            NewUser::new("2040", "Oliver Heyer")
                .admin()
                .into_user(1, Utc::now()),
            NewUser::new("1133399", "Roberta Joan Anderson")
                .with_membership(DeptMembership::new("COENG", DeptRole::Advisor))
                .into_user(2, Utc::now()),
            NewUser::new("666", "Departmentless").into_user(3, Utc::now()),
        ]);
        let state = AuthState::new(Arc::new(SessionStore::new()), Arc::new(users), config);
        auth_routes().with_state(state)
    }

    fn login_request(uid: &str, password: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/auth/dev_auth_login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "uid": uid, "password": password }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_dev_auth_login_sets_cookie() {
        let response = app(AuthConfig::default().with_dev_auth("hunter2"))
            .oneshot(login_request("1133399", "hunter2"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("boac_session="));
        assert!(cookie.contains("HttpOnly"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let profile: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(profile["uid"], "1133399");
        assert_eq!(profile["isCoe"], true);
    }

    #[tokio::test]
    async fn test_dev_auth_login_wrong_password() {
        let response = app(AuthConfig::default().with_dev_auth("hunter2"))
            .oneshot(login_request("2040", "Born in the USA"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_dev_auth_login_unknown_or_departmentless_user() {
        let app = app(AuthConfig::default().with_dev_auth("hunter2"));
        for uid in ["9999999", "666"] {
            let response = app
                .clone()
                .oneshot(login_request(uid, "hunter2"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "uid {uid}");
        }
    }

    #[tokio::test]
    async fn test_dev_auth_disabled() {
        let response = app(AuthConfig::default())
            .oneshot(login_request("2040", ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout_without_session() {
        let response = app(AuthConfig::default())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["isAnonymous"], true);
    }
}
