use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use boac_auth::CurrentUser;
use boac_core::note::NoteView;
use boac_core::student::{Student, StudentProfile, StudentVisibility, TeamGroup};
use boac_core::user::{
    can_use_private_notes, is_asc_authorized, is_coe_authorized, AuthorizedUser,
};

use super::authz::{require_advisor, require_asc};
use super::{ApiError, AppError};
use crate::state::AppState;

/// Profile fields the viewer's departments unlock.
pub fn visibility(viewer: &AuthorizedUser) -> StudentVisibility {
    StudentVisibility {
        athletics: is_asc_authorized(viewer),
        coe: is_coe_authorized(viewer),
    }
}

pub fn profiles(viewer: &AuthorizedUser, students: &[Student]) -> Vec<StudentProfile> {
    let visibility = visibility(viewer);
    students
        .iter()
        .map(|s| StudentProfile::from_student(s, visibility))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct Notifications {
    pub note: Vec<NoteView>,
}

#[derive(Debug, Serialize)]
pub struct StudentWithNotes {
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub notifications: Notifications,
}

/// Notes about a student as the viewer sees them, oldest first.
pub async fn note_views(
    state: &AppState,
    viewer: &AuthorizedUser,
    sid: &str,
) -> Result<Vec<NoteView>, AppError> {
    let notes = state.notes.get_notes_by_sid(sid).await?;
    let ids: Vec<i64> = notes.iter().map(|n| n.id).collect();
    let read = state.notes.get_read_note_ids(viewer.id, &ids).await?;
    let can_see_private = can_use_private_notes(viewer);

    Ok(notes
        .iter()
        .map(|n| NoteView::new(n, can_see_private, read.contains(&n.id)))
        .collect())
}

async fn with_notes(
    state: &AppState,
    viewer: &AuthorizedUser,
    student: Student,
) -> Result<Json<StudentWithNotes>, AppError> {
    let note = note_views(state, viewer, &student.sid).await?;
    Ok(Json(StudentWithNotes {
        profile: StudentProfile::from_student(&student, visibility(viewer)),
        notifications: Notifications { note },
    }))
}

/// Student profile with notes (GET /api/student/by_sid/{sid}).
pub async fn get_student_by_sid(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sid): Path<String>,
) -> Result<Json<StudentWithNotes>, AppError> {
    require_advisor(&user)?;
    let student = state
        .students
        .get_student(&sid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Unknown student {sid}")))?;

    with_notes(&state, &user, student).await
}

/// Student profile with notes, by campus UID (GET /api/student/by_uid/{uid}).
pub async fn get_student_by_uid(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(uid): Path<String>,
) -> Result<Json<StudentWithNotes>, AppError> {
    require_advisor(&user)?;
    let student = state
        .students
        .get_student_by_uid(&uid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Unknown student {uid}")))?;

    with_notes(&state, &user, student).await
}

/// All athletic team groups (GET /api/team_groups/all).
pub async fn list_team_groups(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<TeamGroup>>, AppError> {
    require_asc(&user)?;
    Ok(Json(state.students.list_team_groups().await?))
}
