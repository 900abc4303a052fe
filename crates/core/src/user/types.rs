use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Department code for the College of Engineering.
pub const COE_DEPT_CODE: &str = "COENG";
/// Department code for the Athletic Study Center.
pub const ASC_DEPT_CODE: &str = "UWASC";
/// Department code for the Centers for Educational Equity and Excellence.
pub const CE3_DEPT_CODE: &str = "ZCEEE";

const DEPARTMENTS: &[(&str, &str)] = &[
    (COE_DEPT_CODE, "College of Engineering"),
    (ASC_DEPT_CODE, "Athletic Study Center"),
    (CE3_DEPT_CODE, "Centers for Educational Equity and Excellence"),
    ("QCADV", "L&S College Advising"),
    ("QCADVMAJ", "L&S Major Advising"),
    ("HENGL", "Department of English"),
];

/// Returns the display name of a department code, if known.
pub fn dept_name(code: &str) -> Option<&'static str> {
    DEPARTMENTS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Role a user holds within a university department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeptRole {
    Advisor,
    Director,
    Scheduler,
}

impl DeptRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeptRole::Advisor => "advisor",
            DeptRole::Director => "director",
            DeptRole::Scheduler => "scheduler",
        }
    }
}

impl std::fmt::Display for DeptRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeptRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "advisor" => Ok(DeptRole::Advisor),
            "director" => Ok(DeptRole::Director),
            "scheduler" => Ok(DeptRole::Scheduler),
            other => Err(format!("Unknown department role: {other}")),
        }
    }
}

/// Membership of a user in a university department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeptMembership {
    pub dept_code: String,
    pub role: DeptRole,
    pub is_drop_in_advisor: bool,
}

impl DeptMembership {
    pub fn new(dept_code: impl Into<String>, role: DeptRole) -> Self {
        Self {
            dept_code: dept_code.into(),
            role,
            is_drop_in_advisor: false,
        }
    }

    pub fn drop_in(mut self) -> Self {
        self.is_drop_in_advisor = true;
        self
    }
}

/// A user allowed to sign in to BOAC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    pub id: i64,
    pub uid: String,
    pub name: String,
    /// Job title from the campus directory.
    pub title: Option<String>,
    /// Department affiliation from the campus directory.
    pub dept_affiliation: Option<String>,
    pub is_admin: bool,
    pub can_access_advising_data: bool,
    pub departments: Vec<DeptMembership>,
    pub created_at: DateTime<Utc>,
}

impl AuthorizedUser {
    pub fn dept_codes(&self) -> Vec<String> {
        self.departments.iter().map(|m| m.dept_code.clone()).collect()
    }

    pub fn is_member_of(&self, dept_code: &str) -> bool {
        self.departments
            .iter()
            .any(|m| m.dept_code.eq_ignore_ascii_case(dept_code))
    }
}

/// Data needed to register a new user. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub uid: String,
    pub name: String,
    pub title: Option<String>,
    pub dept_affiliation: Option<String>,
    pub is_admin: bool,
    pub can_access_advising_data: bool,
    pub departments: Vec<DeptMembership>,
}

impl NewUser {
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            title: None,
            dept_affiliation: None,
            is_admin: false,
            can_access_advising_data: true,
            departments: Vec::new(),
        }
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn without_advising_data(mut self) -> Self {
        self.can_access_advising_data = false;
        self
    }

    pub fn with_membership(mut self, membership: DeptMembership) -> Self {
        self.departments.push(membership);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_dept_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.dept_affiliation = Some(affiliation.into());
        self
    }

    pub fn into_user(self, id: i64, created_at: DateTime<Utc>) -> AuthorizedUser {
        AuthorizedUser {
            id,
            uid: self.uid,
            name: self.name,
            title: self.title,
            dept_affiliation: self.dept_affiliation,
            is_admin: self.is_admin,
            can_access_advising_data: self.can_access_advising_data,
            departments: self.departments,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dept_name_lookup_is_case_insensitive() {
        assert_eq!(dept_name("coeng"), Some("College of Engineering"));
        assert_eq!(dept_name("UWASC"), Some("Athletic Study Center"));
        assert_eq!(dept_name("NOPE"), None);
    }

    #[test]
    fn test_dept_role_parse() {
        assert_eq!("Director".parse::<DeptRole>(), Ok(DeptRole::Director));
        assert!("janitor".parse::<DeptRole>().is_err());
    }

    #[test]
    fn test_new_user_builder() {
        let user = NewUser::new("2040", "Oliver Heyer")
            .admin()
            .with_membership(DeptMembership::new(COE_DEPT_CODE, DeptRole::Advisor).drop_in())
            .into_user(1, Utc::now());

        assert!(user.is_admin);
        assert!(user.is_member_of("coeng"));
        assert!(user.departments[0].is_drop_in_advisor);
        assert_eq!(user.dept_codes(), vec!["COENG".to_string()]);
    }
}
