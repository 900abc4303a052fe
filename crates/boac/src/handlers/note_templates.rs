use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde_json::{json, Value};

use boac_auth::CurrentUser;
use boac_core::note::{
    CreateNoteTemplateForm, NewNoteTemplate, NoteError, NoteTemplate, NoteTemplateView,
};
use boac_core::storage::RepositoryError;
use boac_core::user::{can_use_private_notes, AuthorizedUser};

use super::authz::{require_advisor, AuthzError};
use super::multipart::{read_multipart, store_uploads};
use super::{ApiError, AppError};
use crate::state::AppState;

async fn created_template(
    state: &AppState,
    user: &AuthorizedUser,
    id: i64,
) -> Result<NoteTemplate, AppError> {
    let template = state
        .note_templates
        .get_note_template(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No note template found with id: {id}")))?;
    if !template.is_created_by(user.id) {
        return Err(AuthzError::forbidden(
            user,
            format!("Note template {id} belongs to another user"),
        )
        .into());
    }
    Ok(template)
}

/// Saves a note template (POST /api/note_template/create).
pub async fn create_note_template(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<NoteTemplateView>, AppError> {
    require_advisor(&user)?;
    let config = &state.config;
    let form = read_multipart(multipart, config.max_attachment_bytes(), config.max_attachment_size_mb).await?;
    let (title, draft) = form.parse::<CreateNoteTemplateForm>()?.validate()?;
    if draft.is_private && !can_use_private_notes(&user) {
        return Err(AuthzError::forbidden(&user, "Sorry, you are not authorized to manage private notes").into());
    }

    let attachments = store_uploads(&state, form.uploads, &user.uid).await?;
    let template = state
        .note_templates
        .create_note_template(NewNoteTemplate {
            creator_id: user.id,
            title: title.clone(),
            subject: draft.subject,
            body: draft.body,
            topics: draft.topics,
            is_private: draft.is_private,
            attachments,
        })
        .await
        .map_err(|err| match err {
            RepositoryError::AlreadyExists { .. } => AppError::from(NoteError::DuplicateTemplateTitle(title)),
            other => AppError::from(other),
        })?;

    tracing::info!(note_template_id = template.id, uid = %user.uid, "Created note template");
    Ok(Json(NoteTemplateView::from(&template)))
}

/// The viewer's templates ordered by title (GET /api/note_templates/my).
pub async fn my_note_templates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<NoteTemplateView>>, AppError> {
    require_advisor(&user)?;
    let templates = state.note_templates.list_note_templates_by_creator(user.id).await?;
    Ok(Json(templates.iter().map(NoteTemplateView::from).collect()))
}

/// GET /api/note_template/{id}
pub async fn get_note_template(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<NoteTemplateView>, AppError> {
    require_advisor(&user)?;
    let template = created_template(&state, &user, id).await?;
    Ok(Json(NoteTemplateView::from(&template)))
}

/// DELETE /api/note_template/delete/{id}
pub async fn delete_note_template(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_advisor(&user)?;
    created_template(&state, &user, id).await?;

    state.note_templates.delete_note_template(id).await?;
    tracing::info!(note_template_id = id, uid = %user.uid, "Deleted note template");
    Ok(Json(json!({ "message": format!("Note template {id} deleted") })))
}
