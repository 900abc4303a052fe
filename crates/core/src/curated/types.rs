use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::student::dedupe_sids;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CuratedGroupError {
    #[error("Curated group creation requires 'name'")]
    NameRequired,
    #[error("Select at least one CSV column")]
    NoCsvColumns,
}

/// An advisor-maintained list of students. SIDs are unique and keep the
/// order in which they were added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedGroup {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub sids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CuratedGroup {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }

    /// Appends SIDs not already present. Returns how many were added.
    pub fn add_sids<S: AsRef<str>>(&mut self, sids: &[S]) -> usize {
        let before = self.sids.len();
        let existing = self.sids.iter().map(String::as_str);
        self.sids = dedupe_sids(existing.chain(sids.iter().map(AsRef::as_ref)));
        self.sids.len() - before
    }

    /// Removes a SID. Returns false when it was not a member.
    pub fn remove_sid(&mut self, sid: &str) -> bool {
        let before = self.sids.len();
        self.sids.retain(|s| s != sid);
        self.sids.len() != before
    }
}

#[derive(Debug, Clone)]
pub struct NewCuratedGroup {
    pub owner_id: i64,
    pub name: String,
    pub sids: Vec<String>,
}

impl NewCuratedGroup {
    pub fn new(owner_id: i64, name: impl Into<String>, sids: Vec<String>) -> Self {
        Self {
            owner_id,
            name: name.into(),
            sids,
        }
    }

    pub fn into_group(self, id: i64, now: DateTime<Utc>) -> CuratedGroup {
        CuratedGroup {
            id,
            owner_id: self.owner_id,
            name: self.name,
            sids: dedupe_sids(self.sids),
            created_at: now,
            updated_at: now,
        }
    }
}
