use axum::{
    response::{IntoResponse, Response},
    Json,
};
use boac_auth::OptionalUser;
use boac_core::user::UserProfile;
use serde_json::json;

/// The signed-in user with derived flags (GET /api/profile/my).
pub async fn my_profile(OptionalUser(user): OptionalUser) -> Response {
    match user {
        Some(user) => Json(UserProfile::from(&user)).into_response(),
        None => Json(json!({ "isAnonymous": true })).into_response(),
    }
}
