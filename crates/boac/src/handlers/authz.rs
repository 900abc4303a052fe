//! Role guards for API handlers.
//!
//! Missing roles answer 401 (the client should treat the session as
//! insufficient); restricted data answers 403.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use boac_core::user::{
    can_access_advising_data, is_admin, is_advisor, is_asc_authorized, is_director,
    is_drop_in_authorized, AuthorizedUser,
};

#[derive(Debug, Error)]
pub enum AuthzError {
    /// The user lacks a role the route requires.
    #[error("Unauthorized")]
    MissingRole { uid: String, required: &'static str },
    /// The user may use the route but not this resource.
    #[error("{message}")]
    Forbidden { uid: String, message: String },
}

impl AuthzError {
    pub fn forbidden(user: &AuthorizedUser, message: impl Into<String>) -> Self {
        let error = Self::Forbidden {
            uid: user.uid.clone(),
            message: message.into(),
        };
        error.log();
        error
    }

    fn missing_role(user: &AuthorizedUser, required: &'static str) -> Self {
        let error = Self::MissingRole {
            uid: user.uid.clone(),
            required,
        };
        error.log();
        error
    }

    fn log(&self) {
        match self {
            Self::MissingRole { uid, required } => {
                tracing::warn!(uid = %uid, required = %required, "Authorization denied: missing role");
            }
            Self::Forbidden { uid, message } => {
                tracing::warn!(uid = %uid, reason = %message, "Authorization denied");
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingRole { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(json!({ "message": self.to_string() })),
        )
            .into_response()
    }
}

pub fn require_advising_data(user: &AuthorizedUser) -> Result<(), AuthzError> {
    if can_access_advising_data(user) {
        Ok(())
    } else {
        Err(AuthzError::missing_role(user, "advising data access"))
    }
}

/// Advising-data access plus an advisor or director role.
pub fn require_advisor(user: &AuthorizedUser) -> Result<(), AuthzError> {
    require_advising_data(user)?;
    if is_advisor(user) {
        Ok(())
    } else {
        Err(AuthzError::missing_role(user, "advisor"))
    }
}

pub fn require_admin(user: &AuthorizedUser) -> Result<(), AuthzError> {
    if is_admin(user) {
        Ok(())
    } else {
        Err(AuthzError::missing_role(user, "admin"))
    }
}

/// Advising-data access plus admin or a director role.
pub fn require_admin_or_director(user: &AuthorizedUser) -> Result<(), AuthzError> {
    require_advising_data(user)?;
    if is_admin(user) || is_director(user) {
        Ok(())
    } else {
        Err(AuthzError::missing_role(user, "admin or director"))
    }
}

/// Advising-data access plus a membership in a drop-in department.
pub fn require_drop_in(user: &AuthorizedUser, drop_in_depts: &[String]) -> Result<(), AuthzError> {
    require_advising_data(user)?;
    if is_drop_in_authorized(user, drop_in_depts) {
        Ok(())
    } else {
        Err(AuthzError::missing_role(user, "drop-in advising"))
    }
}

/// Athlete data is restricted to ASC and admins.
pub fn require_asc(user: &AuthorizedUser) -> Result<(), AuthzError> {
    if is_asc_authorized(user) {
        Ok(())
    } else {
        Err(AuthzError::forbidden(
            user,
            "You are unauthorized to access athletics data",
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use boac_core::user::{DeptMembership, DeptRole, NewUser};

    #[test]
    fn test_scheduler_is_not_an_advisor() {
        let scheduler = NewUser::new("6972201", "Scheduler")
            .with_membership(DeptMembership::new("COENG", DeptRole::Scheduler))
            .into_user(1, Utc::now());

        let err = require_advisor(&scheduler).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(require_drop_in(&scheduler, &["COENG".to_string()]).is_ok());
        assert!(require_drop_in(&scheduler, &["QCADV".to_string()]).is_err());
    }

    #[test]
    fn test_director_without_advising_data() {
        let director = NewUser::new("1015674", "Director")
            .without_advising_data()
            .with_membership(DeptMembership::new("QCADV", DeptRole::Director).drop_in())
            .into_user(1, Utc::now());

        for result in [
            require_admin_or_director(&director),
            require_drop_in(&director, &["QCADV".to_string()]),
            require_advising_data(&director),
        ] {
            assert_eq!(result.unwrap_err().status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_asc_guard_is_forbidden() {
        let coe = NewUser::new("1022796", "COE director")
            .with_membership(DeptMembership::new("COENG", DeptRole::Director))
            .into_user(1, Utc::now());

        assert!(require_advisor(&coe).is_ok());
        assert!(require_admin_or_director(&coe).is_ok());
        assert_eq!(
            require_asc(&coe).unwrap_err().status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            require_admin(&coe).unwrap_err().status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
