use std::collections::HashSet;
use std::io::{Cursor, Write};

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use boac_auth::CurrentUser;
use boac_core::cohort::StudentQuery;
use boac_core::note::{
    CreateNoteForm, NewAttachment, NewNote, Note, NoteAuthor, NoteError, NoteView, UpdateNoteForm,
};
use boac_core::student::dedupe_sids;
use boac_core::user::{can_use_private_notes, can_view_cohort, is_admin, AuthorizedUser};

use super::authz::{require_admin_or_director, require_advising_data, require_advisor, AuthzError};
use super::multipart::{discard_uploads, read_multipart, store_uploads};
use super::students::note_views;
use super::{ApiError, AppError};
use crate::state::AppState;

const ATTACHMENT_NOT_AVAILABLE: &str = "Sorry, attachment not available.";

fn note_not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("Note {id} not found"))
}

async fn live_note(state: &AppState, id: i64) -> Result<Note, AppError> {
    let note = state
        .notes
        .get_note(id)
        .await?
        .filter(|n| !n.is_deleted())
        .ok_or_else(|| note_not_found(id))?;
    Ok(note)
}

async fn view_for(state: &AppState, viewer: &AuthorizedUser, note: &Note) -> Result<NoteView, AppError> {
    let read = state.notes.get_read_note_ids(viewer.id, &[note.id]).await?;
    Ok(NoteView::new(
        note,
        can_use_private_notes(viewer),
        read.contains(&note.id),
    ))
}

fn require_author(user: &AuthorizedUser, note: &Note) -> Result<(), AuthzError> {
    if note.is_authored_by(&user.uid) {
        Ok(())
    } else {
        Err(AuthzError::forbidden(
            user,
            format!("Sorry, you are not the author of note {}", note.id),
        ))
    }
}

fn require_private_notes(user: &AuthorizedUser) -> Result<(), AuthzError> {
    if can_use_private_notes(user) {
        Ok(())
    } else {
        Err(AuthzError::forbidden(
            user,
            "Sorry, you are not authorized to manage private notes",
        ))
    }
}

/// `attachment; filename*=UTF-8''...` for a download.
fn content_disposition(filename: &str) -> String {
    format!("attachment; filename*=UTF-8''{}", urlencoding::encode(filename))
}

pub(super) fn download(filename: &str, content_type: &'static str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        bytes,
    )
        .into_response()
}

/// A single note (GET /api/note/{id}).
pub async fn get_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<NoteView>, AppError> {
    require_advisor(&user)?;
    let note = live_note(&state, id).await?;
    Ok(Json(view_for(&state, &user, &note).await?))
}

/// SIDs a batch note goes to: explicit SIDs, then cohort members, then
/// curated group members, first occurrence wins.
async fn resolve_recipients(
    state: &AppState,
    author: &AuthorizedUser,
    form: &CreateNoteForm,
) -> Result<Vec<String>, AppError> {
    let mut sids = form.sids.clone();

    for &cohort_id in &form.cohort_ids {
        let not_found = || ApiError::not_found(format!("No cohort found with identifier: {cohort_id}"));
        let cohort = state.cohorts.get_cohort(cohort_id).await?.ok_or_else(not_found)?;
        let owner = state
            .users
            .get_user_by_uid(&cohort.owner_uid)
            .await?
            .filter(|owner| can_view_cohort(author, owner))
            .ok_or_else(not_found)?;
        let query = StudentQuery::for_owner(cohort.criteria, &owner).with_page(0, None);
        let page = state.students.query_students(&query).await?;
        sids.extend(page.students.into_iter().map(|s| s.sid));
    }

    for &group_id in &form.curated_group_ids {
        let group = state
            .curated_groups
            .get_curated_group(group_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No curated group found with id: {group_id}")))?;
        if !group.is_owned_by(author.id) {
            return Err(AuthzError::forbidden(
                author,
                format!("Current user, {}, does not own curated group {group_id}", author.uid),
            )
            .into());
        }
        sids.extend(group.sids);
    }

    Ok(dedupe_sids(sids))
}

/// Template attachments to copy onto new notes. Each id must belong to one
/// of the author's templates.
async fn template_attachments(
    state: &AppState,
    author: &AuthorizedUser,
    ids: &[i64],
) -> Result<Vec<NewAttachment>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found = state.note_templates.get_template_attachments(ids).await?;
    let mut attachments = Vec::with_capacity(found.len());
    for &id in ids {
        let attachment = found
            .iter()
            .find(|a| a.id == id)
            .ok_or(NoteError::ForeignTemplateAttachment(id))?;
        let owned = state
            .note_templates
            .get_note_template(attachment.note_template_id)
            .await?
            .is_some_and(|t| t.is_created_by(author.id));
        if !owned {
            tracing::warn!(uid = %author.uid, attachment_id = id, "Foreign template attachment");
            return Err(NoteError::ForeignTemplateAttachment(id).into());
        }
        attachments.push(attachment.to_new_attachment());
    }
    Ok(attachments)
}

/// Creates one note per recipient (POST /api/notes/create).
///
/// A single recipient gets the note back; a batch gets `{noteIds, sids}`.
pub async fn create_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    require_advisor(&user)?;
    if is_admin(&user) {
        return Err(AuthzError::forbidden(&user, "Sorry, admins cannot author notes").into());
    }

    let config = &state.config;
    let form = read_multipart(multipart, config.max_attachment_bytes(), config.max_attachment_size_mb).await?;
    let request: CreateNoteForm = form.parse()?;
    if !request.has_recipients() {
        return Err(NoteError::NoRecipients.into());
    }
    let draft = request.draft()?;
    if draft.is_private {
        require_private_notes(&user)?;
    }

    let sids = resolve_recipients(&state, &user, &request).await?;
    if sids.is_empty() {
        return Err(NoteError::NoRecipients.into());
    }
    let mut attachments = template_attachments(&state, &user, &request.template_attachment_ids).await?;
    let uploads = store_uploads(&state, form.uploads, &user.uid).await?;
    attachments.extend(uploads.iter().cloned());

    let author = NoteAuthor::of(&user);
    let new_notes = sids
        .iter()
        .map(|sid| NewNote {
            sid: sid.clone(),
            author: author.clone(),
            draft: draft.clone(),
            attachments: attachments.clone(),
        })
        .collect();
    let notes = match state.notes.create_notes(new_notes, user.id).await {
        Ok(notes) => notes,
        Err(err) => {
            discard_uploads(&state, &uploads).await;
            return Err(err.into());
        }
    };
    tracing::info!(uid = %user.uid, count = notes.len(), "Created notes");

    match notes.as_slice() {
        [note] => Ok(Json(NoteView::new(note, can_use_private_notes(&user), true)).into_response()),
        _ => {
            let note_ids: Vec<i64> = notes.iter().map(|n| n.id).collect();
            Ok(Json(json!({ "noteIds": note_ids, "sids": sids })).into_response())
        }
    }
}

/// Replaces a note's content (POST /api/notes/update).
pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<NoteView>, AppError> {
    require_advisor(&user)?;
    let config = &state.config;
    let form = read_multipart(multipart, config.max_attachment_bytes(), config.max_attachment_size_mb).await?;
    let request: UpdateNoteForm = form.parse()?;

    let note = live_note(&state, request.id).await?;
    require_author(&user, &note)?;
    let draft = request.draft()?;
    if draft.is_private != note.is_private {
        require_private_notes(&user)?;
    }

    let note = state.notes.update_note(note.id, &draft, Utc::now()).await?;
    tracing::info!(note_id = note.id, uid = %user.uid, "Updated note");
    Ok(Json(view_for(&state, &user, &note).await?))
}

/// Soft-deletes a note (DELETE /api/notes/delete/{id}).
pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_advising_data(&user)?;
    if !is_admin(&user) {
        return Err(AuthzError::forbidden(&user, "Sorry, you are not authorized to delete notes.").into());
    }
    live_note(&state, id).await?;

    state.notes.delete_note(id, Utc::now()).await?;
    tracing::info!(note_id = id, uid = %user.uid, "Deleted note");
    Ok(Json(json!({ "message": format!("Note {id} deleted") })))
}

/// Records that the viewer read a note (POST /api/notes/{id}/mark_read).
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_advisor(&user)?;
    live_note(&state, id).await?;
    state.notes.mark_read(id, user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "noteId": id, "viewerId": user.id })),
    ))
}

/// Uploads more attachments (POST /api/notes/{id}/attachments).
pub async fn add_attachments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<NoteView>, AppError> {
    require_advisor(&user)?;
    let note = live_note(&state, id).await?;
    require_author(&user, &note)?;

    let config = &state.config;
    let form = read_multipart(multipart, config.max_attachment_bytes(), config.max_attachment_size_mb).await?;
    if form.uploads.is_empty() {
        return Err(ApiError::bad_request("No attachments in request").into());
    }
    let attachments = store_uploads(&state, form.uploads, &user.uid).await?;
    let note = state.notes.add_attachments(id, attachments, Utc::now()).await?;

    tracing::info!(note_id = id, uid = %user.uid, "Added note attachments");
    Ok(Json(view_for(&state, &user, &note).await?))
}

/// Removes an attachment (DELETE /api/notes/{id}/attachment/{attachment_id}).
pub async fn remove_attachment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, attachment_id)): Path<(i64, i64)>,
) -> Result<Json<NoteView>, AppError> {
    require_advisor(&user)?;
    let note = live_note(&state, id).await?;
    require_author(&user, &note)?;

    let note = state.notes.delete_attachment(id, attachment_id, Utc::now()).await?;
    tracing::info!(note_id = id, attachment_id, "Removed note attachment");
    Ok(Json(view_for(&state, &user, &note).await?))
}

/// Attachment bytes (GET /api/notes/attachment/{id}).
pub async fn download_attachment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    require_advisor(&user)?;
    let not_available = || ApiError::not_found(ATTACHMENT_NOT_AVAILABLE);

    let attachment = state
        .notes
        .get_attachment(id)
        .await?
        .filter(|a| a.deleted_at.is_none())
        .ok_or_else(not_available)?;
    let note = state
        .notes
        .get_note(attachment.note_id)
        .await?
        .filter(|n| !n.is_deleted())
        .ok_or_else(not_available)?;
    if note.is_private {
        require_private_notes(&user)?;
    }

    let bytes = state
        .attachments
        .get(&attachment.path_to_attachment)
        .await?
        .ok_or_else(|| {
            tracing::warn!(attachment_id = id, path = %attachment.path_to_attachment, "Attachment missing from store");
            not_available()
        })?;
    Ok(download(&attachment.filename, "application/octet-stream", bytes))
}

/// `advising_notes_{first}_{last}_{YYYYMMDD}.zip`, lowercased.
fn zip_filename(first_name: &str, last_name: &str, date: chrono::NaiveDate) -> String {
    format!(
        "advising_notes_{first_name}_{last_name}_{}.zip",
        date.format("%Y%m%d")
    )
    .to_lowercase()
    .replace(' ', "_")
}

fn write_zip(notes_json: Vec<u8>, files: Vec<(String, Vec<u8>)>) -> anyhow::Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file("notes.json", options)?;
    writer.write_all(&notes_json)?;
    for (name, bytes) in files {
        writer.start_file(name, options)?;
        writer.write_all(&bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// ZIP of a student's notes and attachments
/// (GET /api/notes/download_for_sid/{sid}).
pub async fn download_for_sid(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sid): Path<String>,
) -> Result<Response, AppError> {
    require_admin_or_director(&user)?;
    let student = state
        .students
        .get_student(&sid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Unknown student {sid}")))?;

    let views = note_views(&state, &user, &sid).await?;
    let mut names = HashSet::new();
    let mut files = Vec::new();
    for attachment in views.iter().flat_map(|v| &v.attachments) {
        let Some(stored) = state.notes.get_attachment(attachment.id).await? else {
            continue;
        };
        match state.attachments.get(&stored.path_to_attachment).await? {
            Some(bytes) => {
                let name = if names.insert(stored.filename.clone()) {
                    stored.filename
                } else {
                    format!("{}_{}", stored.id, stored.filename)
                };
                files.push((name, bytes));
            }
            None => {
                tracing::warn!(attachment_id = stored.id, sid = %sid, "Attachment missing from store");
            }
        }
    }
    let notes_json = serde_json::to_vec_pretty(&views)?;

    let archive = tokio::task::spawn_blocking(move || write_zip(notes_json, files)).await??;
    let filename = zip_filename(&student.first_name, &student.last_name, Utc::now().date_naive());

    tracing::info!(sid = %sid, uid = %user.uid, notes = views.len(), "Downloaded notes archive");
    Ok(download(&filename, "application/zip", archive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_zip_filename() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        assert_eq!(
            zip_filename("Deborah", "Davies Moore", date),
            "advising_notes_deborah_davies_moore_20200229.zip"
        );
    }

    #[test]
    fn test_content_disposition_is_percent_encoded() {
        assert_eq!(
            content_disposition("dog eat dog.pdf"),
            "attachment; filename*=UTF-8''dog%20eat%20dog.pdf"
        );
    }

    #[test]
    fn test_write_zip() {
        let archive = write_zip(
            b"[]".to_vec(),
            vec![("potato.txt".to_string(), b"wild".to_vec())],
        )
        .unwrap();

        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
        assert_eq!(zip.len(), 2);
        assert!(zip.by_name("notes.json").is_ok());
        assert!(zip.by_name("potato.txt").is_ok());
    }
}
