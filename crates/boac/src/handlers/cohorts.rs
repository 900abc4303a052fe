use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use boac_auth::CurrentUser;
use boac_core::cohort::{
    CohortFilter, CreateCohortRequest, CriteriaError, FilterCriteria, NewCohort,
    StudentsPerFiltersRequest, StudentQuery, UpdateCohortRequest,
};
use boac_core::student::StudentProfile;
use boac_core::user::{can_view_cohort, is_asc_authorized, is_coe_authorized, AuthorizedUser};

use super::authz::{require_advising_data, AuthzError};
use super::students::profiles;
use super::{json_body, ApiError, AppError};
use crate::models::{parse_order, CohortView, CohortsByOwner, OwnerView, StudentListParams};
use crate::state::AppState;

fn cohort_not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("No cohort found with identifier: {id}"))
}

fn check_criteria_access(user: &AuthorizedUser, criteria: &FilterCriteria) -> Result<(), AppError> {
    criteria
        .check_access(is_asc_authorized(user), is_coe_authorized(user))
        .map_err(|err| {
            tracing::warn!(uid = %user.uid, error = %err, "Restricted cohort filter");
            AppError::from(err)
        })
}

async fn owner_of(state: &AppState, cohort: &CohortFilter) -> Result<AuthorizedUser, AppError> {
    state
        .users
        .get_user_by_uid(&cohort.owner_uid)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Owner {} of cohort {} is missing", cohort.owner_uid, cohort.id).into())
}

/// Counts the cohort's students and caches the count when it changed.
async fn refresh_student_count(
    state: &AppState,
    cohort: &mut CohortFilter,
    owner: &AuthorizedUser,
) -> Result<(), AppError> {
    let query = StudentQuery::for_owner(cohort.criteria.clone(), owner).with_page(0, Some(0));
    let total = state.students.query_students(&query).await?.total_student_count;
    let total = i64::try_from(total).unwrap_or(i64::MAX);
    if cohort.student_count != Some(total) {
        cohort.student_count = Some(total);
        state.cohorts.update_cohort(cohort).await?;
    }
    Ok(())
}

/// Cached count, computing it when missing.
async fn summary(
    state: &AppState,
    mut cohort: CohortFilter,
    owner: &AuthorizedUser,
    viewer: &AuthorizedUser,
) -> Result<CohortView, AppError> {
    if cohort.student_count.is_none() {
        refresh_student_count(state, &mut cohort, owner).await?;
    }
    Ok(CohortView::new(&cohort, owner, viewer))
}

/// The viewer's cohorts, sorted by name (GET /api/cohorts/my).
pub async fn my_cohorts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CohortView>>, AppError> {
    require_advising_data(&user)?;
    let mut cohorts = state.cohorts.list_cohorts_owned_by(&user.uid).await?;
    cohorts.sort_by_cached_key(|c| (c.name.to_lowercase(), c.id));

    let mut views = Vec::with_capacity(cohorts.len());
    for cohort in cohorts {
        views.push(summary(&state, cohort, &user, &user).await?);
    }
    Ok(Json(views))
}

/// Every viewable cohort grouped by owner (GET /api/cohorts/all).
pub async fn all_cohorts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CohortsByOwner>>, AppError> {
    require_advising_data(&user)?;
    let mut by_owner: HashMap<String, Vec<CohortFilter>> = HashMap::new();
    for cohort in state.cohorts.list_cohorts().await? {
        by_owner.entry(cohort.owner_uid.clone()).or_default().push(cohort);
    }

    let mut owners = state.users.list_users().await?;
    owners.sort_by_cached_key(|u| (u.name.to_lowercase(), u.uid.clone()));

    let mut result = Vec::new();
    for owner in owners {
        if !can_view_cohort(&user, &owner) {
            continue;
        }
        let Some(mut cohorts) = by_owner.remove(&owner.uid) else {
            continue;
        };
        cohorts.sort_by_cached_key(|c| (c.name.to_lowercase(), c.id));
        let mut views = Vec::with_capacity(cohorts.len());
        for cohort in cohorts {
            views.push(summary(&state, cohort, &owner, &user).await?);
        }
        result.push(CohortsByOwner {
            user: OwnerView::of(&owner),
            cohorts: views,
        });
    }
    Ok(Json(result))
}

/// A cohort with a page of its students (GET /api/cohort/{id}).
pub async fn get_cohort(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Query(params): Query<StudentListParams>,
) -> Result<Json<CohortView>, AppError> {
    require_advising_data(&user)?;
    let mut cohort = state
        .cohorts
        .get_cohort(id)
        .await?
        .ok_or_else(|| cohort_not_found(id))?;
    let owner = owner_of(&state, &cohort).await?;
    if !can_view_cohort(&user, &owner) {
        tracing::warn!(uid = %user.uid, cohort_id = id, "Cohort not viewable");
        return Err(cohort_not_found(id).into());
    }

    let query = StudentQuery::for_owner(cohort.criteria.clone(), &owner)
        .with_order(params.order()?)
        .with_page(params.offset(), Some(params.limit()));
    let page = state.students.query_students(&query).await?;
    let total = i64::try_from(page.total_student_count).unwrap_or(i64::MAX);
    if cohort.student_count != Some(total) {
        cohort.student_count = Some(total);
        state.cohorts.update_cohort(&cohort).await?;
    }

    let mut view = CohortView::new(&cohort, &owner, &user);
    if params.include_students {
        view = view.with_students(profiles(&user, &page.students));
    }
    if is_asc_authorized(&user) {
        if let Some(codes) = cohort.criteria.group_codes.as_ref().filter(|c| !c.is_empty()) {
            let team_groups = state
                .students
                .list_team_groups()
                .await?
                .into_iter()
                .filter(|g| codes.contains(&g.group_code))
                .collect();
            view = view.with_team_groups(team_groups);
        }
    }
    Ok(Json(view))
}

/// Saves a new cohort (POST /api/cohort/create).
pub async fn create_cohort(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreateCohortRequest>, JsonRejection>,
) -> Result<Json<CohortView>, AppError> {
    require_advising_data(&user)?;
    let request = json_body(body)?;
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| ApiError::bad_request("Cohort creation requires 'name'"))?;
    let criteria = request.input.resolve()?.ok_or(CriteriaError::Empty)?;
    check_criteria_access(&user, &criteria)?;

    let mut cohort = state
        .cohorts
        .create_cohort(NewCohort {
            name: name.to_string(),
            owner_uid: user.uid.clone(),
            criteria,
        })
        .await?;
    refresh_student_count(&state, &mut cohort, &user).await?;

    tracing::info!(cohort_id = cohort.id, uid = %user.uid, name = %cohort.name, "Created cohort");
    Ok(Json(CohortView::new(&cohort, &user, &user)))
}

/// Renames a cohort and/or replaces its criteria (POST /api/cohort/update).
pub async fn update_cohort(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<UpdateCohortRequest>, JsonRejection>,
) -> Result<Json<CohortView>, AppError> {
    require_advising_data(&user)?;
    let request = json_body(body)?;
    let name = request.name.as_deref().map(str::trim);
    let criteria = request.input.resolve()?;
    if name.is_none() && criteria.is_none() {
        return Err(ApiError::bad_request("Invalid request: provide a name or filter criteria").into());
    }

    let mut cohort = state
        .cohorts
        .get_cohort(request.id)
        .await?
        .ok_or_else(|| cohort_not_found(request.id))?;
    if !cohort.is_owned_by(&user.uid) {
        return Err(AuthzError::forbidden(
            &user,
            format!("Invalid or unauthorized request: cohort {}", request.id),
        )
        .into());
    }

    if let Some(name) = name {
        cohort.name = name.to_string();
    }
    if let Some(criteria) = criteria {
        check_criteria_access(&user, &criteria)?;
        cohort.criteria = criteria;
        cohort.student_count = None;
    }
    cohort.updated_at = Utc::now();
    state.cohorts.update_cohort(&cohort).await?;
    refresh_student_count(&state, &mut cohort, &user).await?;

    tracing::info!(cohort_id = cohort.id, uid = %user.uid, "Updated cohort");
    Ok(Json(CohortView::new(&cohort, &user, &user)))
}

/// Deletes a cohort the viewer owns (DELETE /api/cohort/delete/{id}).
pub async fn delete_cohort(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_advising_data(&user)?;
    let cohort = state
        .cohorts
        .get_cohort(id)
        .await?
        .ok_or_else(|| cohort_not_found(id))?;
    if !cohort.is_owned_by(&user.uid) {
        tracing::warn!(uid = %user.uid, cohort_id = id, "Delete of cohort owned by someone else");
        return Err(ApiError::bad_request(format!("{} does not own cohort {id}", user.uid)).into());
    }

    state.cohorts.delete_cohort(id).await?;
    tracing::info!(cohort_id = id, uid = %user.uid, "Deleted cohort");
    Ok(Json(json!({ "message": format!("Cohort deleted (id={id})") })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredStudents {
    pub total_student_count: usize,
    pub students: Vec<StudentProfile>,
}

/// Evaluates ad-hoc filters in the viewer's own scope
/// (POST /api/cohort/get_students_per_filters).
pub async fn get_students_per_filters(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<StudentsPerFiltersRequest>, JsonRejection>,
) -> Result<Json<FilteredStudents>, AppError> {
    require_advising_data(&user)?;
    let request = json_body(body)?;
    if request.filters.is_empty() {
        return Err(ApiError::bad_request("API requires 'filters'").into());
    }
    let criteria = FilterCriteria::from_filters(&request.filters)?;
    check_criteria_access(&user, &criteria)?;

    let query = StudentQuery::for_owner(criteria, &user)
        .with_order(parse_order(request.order_by.as_deref())?)
        .with_page(request.offset.unwrap_or(0), request.limit.or(Some(boac_core::cohort::DEFAULT_PAGE_LIMIT)));
    let page = state.students.query_students(&query).await?;

    Ok(Json(FilteredStudents {
        total_student_count: page.total_student_count,
        students: profiles(&user, &page.students),
    }))
}
