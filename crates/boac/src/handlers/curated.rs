use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Response,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use boac_auth::CurrentUser;
use boac_core::cohort::StudentQuery;
use boac_core::curated::{
    csv_filename, students_csv, AddStudentsRequest, CreateCuratedGroupRequest, CuratedGroup,
    DownloadCsvRequest, NewCuratedGroup, RenameCuratedGroupRequest,
};
use boac_core::student::dedupe_sids;
use boac_core::user::AuthorizedUser;

use super::authz::{require_advising_data, AuthzError};
use super::notes::download;
use super::students::profiles;
use super::{json_body, ApiError, AppError};
use crate::models::{CuratedGroupView, CuratedGroupsByOwner, OwnerView, StudentListParams};
use crate::state::AppState;

/// Loads a group and checks that the viewer owns it.
async fn owned_group(
    state: &AppState,
    user: &AuthorizedUser,
    id: i64,
) -> Result<CuratedGroup, AppError> {
    let group = state
        .curated_groups
        .get_curated_group(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No curated group found with id: {id}")))?;
    if !group.is_owned_by(user.id) {
        return Err(AuthzError::forbidden(
            user,
            format!("Current user, {}, does not own curated group {id}", user.uid),
        )
        .into());
    }
    Ok(group)
}

/// Group with its members paged and ordered like cohort results.
async fn with_student_page(
    state: &AppState,
    viewer: &AuthorizedUser,
    group: &CuratedGroup,
    params: &StudentListParams,
) -> Result<CuratedGroupView, AppError> {
    let query = StudentQuery::for_sids(group.sids.clone())
        .with_order(params.order()?)
        .with_page(params.offset(), Some(params.limit()));
    let page = state.students.query_students(&query).await?;
    Ok(CuratedGroupView::from(group)
        .with_students(profiles(viewer, &page.students), page.total_student_count))
}

/// Creates a curated group (POST /api/curated_group/create).
pub async fn create_curated_group(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreateCuratedGroupRequest>, JsonRejection>,
) -> Result<Json<CuratedGroupView>, AppError> {
    require_advising_data(&user)?;
    let request = json_body(body)?;
    let name = request.name()?;
    let group = state
        .curated_groups
        .create_curated_group(NewCuratedGroup::new(user.id, name, dedupe_sids(&request.sids)))
        .await?;

    tracing::info!(curated_group_id = group.id, uid = %user.uid, "Created curated group");
    let view = with_student_page(&state, &user, &group, &StudentListParams::default()).await?;
    Ok(Json(view))
}

/// A curated group with a page of its students (GET /api/curated_group/{id}).
pub async fn get_curated_group(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Query(params): Query<StudentListParams>,
) -> Result<Json<CuratedGroupView>, AppError> {
    require_advising_data(&user)?;
    let group = owned_group(&state, &user, id).await?;
    Ok(Json(with_student_page(&state, &user, &group, &params).await?))
}

/// Adds students to a group (POST /api/curated_group/students/add).
pub async fn add_students(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<AddStudentsRequest>, JsonRejection>,
) -> Result<Json<CuratedGroupView>, AppError> {
    require_advising_data(&user)?;
    let request = json_body(body)?;
    let mut group = owned_group(&state, &user, request.curated_group_id).await?;

    let added = group.add_sids(&dedupe_sids(&request.sids));
    if added > 0 {
        group.updated_at = Utc::now();
        state.curated_groups.update_curated_group(&group).await?;
    }
    tracing::info!(curated_group_id = group.id, added, "Added students to curated group");

    let view = if request.return_student_profiles {
        with_student_page(&state, &user, &group, &StudentListParams::default()).await?
    } else {
        CuratedGroupView::from(&group)
    };
    Ok(Json(view))
}

/// Removes one student (DELETE /api/curated_group/{id}/remove_student/{sid}).
pub async fn remove_student(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, sid)): Path<(i64, String)>,
) -> Result<Json<CuratedGroupView>, AppError> {
    require_advising_data(&user)?;
    let mut group = owned_group(&state, &user, id).await?;

    if group.remove_sid(&sid) {
        group.updated_at = Utc::now();
        state.curated_groups.update_curated_group(&group).await?;
        tracing::info!(curated_group_id = id, sid = %sid, "Removed student from curated group");
    }
    Ok(Json(CuratedGroupView::from(&group)))
}

/// Renames a group (POST /api/curated_group/rename).
pub async fn rename_curated_group(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<RenameCuratedGroupRequest>, JsonRejection>,
) -> Result<Json<CuratedGroupView>, AppError> {
    require_advising_data(&user)?;
    let request = json_body(body)?;
    let name = request.name()?;
    let mut group = owned_group(&state, &user, request.id).await?;

    group.name = name.to_string();
    group.updated_at = Utc::now();
    state.curated_groups.update_curated_group(&group).await?;
    Ok(Json(CuratedGroupView::from(&group)))
}

/// Deletes a group (DELETE /api/curated_group/delete/{id}).
pub async fn delete_curated_group(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_advising_data(&user)?;
    owned_group(&state, &user, id).await?;

    state.curated_groups.delete_curated_group(id).await?;
    tracing::info!(curated_group_id = id, uid = %user.uid, "Deleted curated group");
    Ok(Json(json!({ "message": format!("Curated group {id} deleted") })))
}

/// Selected columns for every member, ordered by name
/// (POST /api/curated_group/{id}/download_csv).
pub async fn download_csv(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    body: Result<Json<DownloadCsvRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    require_advising_data(&user)?;
    let request = json_body(body)?;
    let columns = request.columns()?;
    let group = owned_group(&state, &user, id).await?;

    let query = StudentQuery::for_sids(group.sids.clone()).with_page(0, None);
    let page = state.students.query_students(&query).await?;
    let csv = students_csv(columns, &page.students)?;

    tracing::info!(curated_group_id = id, uid = %user.uid, students = page.students.len(), "Downloaded curated group CSV");
    let filename = csv_filename(&group.name, Utc::now().naive_utc());
    Ok(download(&filename, "text/csv", csv))
}

fn sorted_views(mut groups: Vec<CuratedGroup>) -> Vec<CuratedGroupView> {
    groups.sort_by_cached_key(|g| (g.name.to_lowercase(), g.id));
    groups.iter().map(CuratedGroupView::from).collect()
}

/// The viewer's groups (GET /api/curated_groups/my).
pub async fn my_curated_groups(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CuratedGroupView>>, AppError> {
    require_advising_data(&user)?;
    let groups = state.curated_groups.list_curated_groups_owned_by(user.id).await?;
    Ok(Json(sorted_views(groups)))
}

/// Every group, grouped by owner (GET /api/curated_groups/all).
pub async fn all_curated_groups(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CuratedGroupsByOwner>>, AppError> {
    require_advising_data(&user)?;
    let mut by_owner: HashMap<i64, Vec<CuratedGroup>> = HashMap::new();
    for group in state.curated_groups.list_curated_groups().await? {
        by_owner.entry(group.owner_id).or_default().push(group);
    }

    let mut owners = state.users.list_users().await?;
    owners.sort_by_cached_key(|u| (u.name.to_lowercase(), u.uid.clone()));

    let result = owners
        .into_iter()
        .filter_map(|owner| {
            let groups = by_owner.remove(&owner.id)?;
            Some(CuratedGroupsByOwner {
                user: OwnerView::of(&owner),
                curated_groups: sorted_views(groups),
            })
        })
        .collect();
    Ok(Json(result))
}
