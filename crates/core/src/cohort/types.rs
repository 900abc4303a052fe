use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FilterCriteria;

/// A saved, named filter over the student population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortFilter {
    pub id: i64,
    pub name: String,
    pub owner_uid: String,
    pub criteria: FilterCriteria,
    /// Student count as of the last evaluation.
    pub student_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CohortFilter {
    pub fn is_owned_by(&self, uid: &str) -> bool {
        self.owner_uid == uid
    }
}

#[derive(Debug, Clone)]
pub struct NewCohort {
    pub name: String,
    pub owner_uid: String,
    pub criteria: FilterCriteria,
}

impl NewCohort {
    pub fn into_cohort(self, id: i64, now: DateTime<Utc>) -> CohortFilter {
        CohortFilter {
            id,
            name: self.name,
            owner_uid: self.owner_uid,
            criteria: self.criteria,
            student_count: None,
            created_at: now,
            updated_at: now,
        }
    }
}
