use serde::Serialize;

use boac_core::curated::CuratedGroup;
use boac_core::student::StudentProfile;

use super::OwnerView;

/// Curated group as returned to API clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CuratedGroupView {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub sids: Vec<String>,
    pub student_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<StudentProfile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_student_count: Option<usize>,
}

impl CuratedGroupView {
    pub fn with_students(mut self, students: Vec<StudentProfile>, total: usize) -> Self {
        self.students = Some(students);
        self.total_student_count = Some(total);
        self
    }
}

impl From<&CuratedGroup> for CuratedGroupView {
    fn from(group: &CuratedGroup) -> Self {
        Self {
            id: group.id,
            owner_id: group.owner_id,
            name: group.name.clone(),
            sids: group.sids.clone(),
            student_count: group.sids.len(),
            students: None,
            total_student_count: None,
        }
    }
}

/// One owner's groups in `GET /api/curated_groups/all`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CuratedGroupsByOwner {
    pub user: OwnerView,
    pub curated_groups: Vec<CuratedGroupView>,
}
