use serde::Serialize;

use boac_core::cohort::{CohortFilter, FilterCriteria};
use boac_core::student::{StudentProfile, TeamGroup};
use boac_core::user::AuthorizedUser;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OwnerView {
    pub uid: String,
    pub name: String,
}

impl OwnerView {
    pub fn of(user: &AuthorizedUser) -> Self {
        Self {
            uid: user.uid.clone(),
            name: user.name.clone(),
        }
    }
}

/// Cohort as returned to API clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortView {
    pub id: i64,
    pub name: String,
    pub owner: OwnerView,
    pub is_owned_by_current_user: bool,
    pub criteria: FilterCriteria,
    pub total_student_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<StudentProfile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_groups: Option<Vec<TeamGroup>>,
}

impl CohortView {
    pub fn new(cohort: &CohortFilter, owner: &AuthorizedUser, viewer: &AuthorizedUser) -> Self {
        Self {
            id: cohort.id,
            name: cohort.name.clone(),
            owner: OwnerView::of(owner),
            is_owned_by_current_user: cohort.is_owned_by(&viewer.uid),
            criteria: cohort.criteria.clone(),
            total_student_count: cohort.student_count,
            students: None,
            team_groups: None,
        }
    }

    pub fn with_students(mut self, students: Vec<StudentProfile>) -> Self {
        self.students = Some(students);
        self
    }

    pub fn with_team_groups(mut self, team_groups: Vec<TeamGroup>) -> Self {
        self.team_groups = Some(team_groups);
        self
    }
}

/// One owner's cohorts in `GET /api/cohorts/all`.
#[derive(Debug, Clone, Serialize)]
pub struct CohortsByOwner {
    pub user: OwnerView,
    pub cohorts: Vec<CohortView>,
}
