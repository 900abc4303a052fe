use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use boac_auth::CurrentUser;
use boac_core::topic::{
    sort_topics, CreateTopicRequest, Topic, TopicIdRequest, TopicUsage, UpdateTopicRequest,
};

use super::authz::{require_admin, require_advising_data, require_drop_in};
use super::{json_body, ApiError, AppError};
use crate::models::IncludeDeletedParams;
use crate::state::AppState;

async fn sorted_topics(
    state: &AppState,
    include_deleted: bool,
    keep: impl Fn(&Topic) -> bool,
) -> Result<Vec<Topic>, AppError> {
    let mut topics: Vec<Topic> = state
        .topics
        .list_topics(include_deleted)
        .await?
        .into_iter()
        .filter(|t| keep(t))
        .collect();
    sort_topics(&mut topics);
    Ok(topics)
}

/// GET /api/topics/all
pub async fn all_topics(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<IncludeDeletedParams>,
) -> Result<Json<Vec<Topic>>, AppError> {
    require_advising_data(&user)?;
    Ok(Json(sorted_topics(&state, params.include_deleted, |_| true).await?))
}

/// Topics offered when writing notes (GET /api/topics/for_notes).
pub async fn topics_for_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<IncludeDeletedParams>,
) -> Result<Json<Vec<Topic>>, AppError> {
    require_advising_data(&user)?;
    let topics = sorted_topics(&state, params.include_deleted, |t| t.available_in_notes).await?;
    Ok(Json(topics))
}

/// Topics offered for drop-in appointments (GET /api/topics/for_appointments).
pub async fn topics_for_appointments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<IncludeDeletedParams>,
) -> Result<Json<Vec<Topic>>, AppError> {
    require_drop_in(&user, &state.config.drop_in_departments)?;
    let topics = sorted_topics(&state, params.include_deleted, |t| {
        t.available_in_appointments
    })
    .await?;
    Ok(Json(topics))
}

/// POST /api/topic/create
pub async fn create_topic(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreateTopicRequest>, JsonRejection>,
) -> Result<Json<Topic>, AppError> {
    require_admin(&user)?;
    let request = json_body(body)?;
    let topic = state.topics.create_topic(request.validate()?).await?;

    tracing::info!(topic_id = topic.id, topic = %topic.topic, "Created topic");
    Ok(Json(topic))
}

/// POST /api/topic/update
pub async fn update_topic(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<UpdateTopicRequest>, JsonRejection>,
) -> Result<Json<Topic>, AppError> {
    require_admin(&user)?;
    let request = json_body(body)?;
    let topic = state
        .topics
        .update_topic(request.id, request.topic.validate()?)
        .await?;

    tracing::info!(topic_id = topic.id, topic = %topic.topic, "Updated topic");
    Ok(Json(topic))
}

/// Soft-deletes a topic (DELETE /api/topic/delete/{id}).
pub async fn delete_topic(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    state
        .topics
        .get_topic(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No topic found with id: {id}")))?;

    state.topics.delete_topic(id, Utc::now()).await?;
    tracing::info!(topic_id = id, "Deleted topic");
    Ok(Json(json!({ "message": format!("Topic {id} deleted") })))
}

/// POST /api/topic/undelete
pub async fn undelete_topic(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<TopicIdRequest>, JsonRejection>,
) -> Result<Json<Topic>, AppError> {
    require_admin(&user)?;
    let request = json_body(body)?;
    let topic = state.topics.undelete_topic(request.id).await?;

    tracing::info!(topic_id = topic.id, "Undeleted topic");
    Ok(Json(topic))
}

/// Usage counts per topic id (GET /api/topics/usage_statistics).
pub async fn usage_statistics(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<TopicUsage>, AppError> {
    require_admin(&user)?;
    let topics = state.topics.list_topics(true).await?;
    let note_counts = state.notes.note_topic_counts().await?;
    let appointment_counts = state.appointments.appointment_topic_counts().await?;

    Ok(Json(TopicUsage::from_counts(
        &topics,
        &note_counts,
        &appointment_counts,
    )))
}
