use serde::Serialize;

use super::{
    can_access_advising_data, dept_name, is_asc_authorized, is_coe_authorized, is_director,
    is_scheduler, AuthorizedUser, DeptRole,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentProfile {
    pub code: String,
    pub name: Option<&'static str>,
    pub role: DeptRole,
    pub is_drop_in_advisor: bool,
}

/// The signed-in user with derived permission flags.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub uid: String,
    pub name: String,
    pub title: Option<String>,
    pub is_admin: bool,
    pub is_asc: bool,
    pub is_coe: bool,
    pub is_director: bool,
    pub is_scheduler: bool,
    pub can_access_advising_data: bool,
    pub departments: Vec<DepartmentProfile>,
}

impl From<&AuthorizedUser> for UserProfile {
    fn from(user: &AuthorizedUser) -> Self {
        Self {
            id: user.id,
            uid: user.uid.clone(),
            name: user.name.clone(),
            title: user.title.clone(),
            is_admin: user.is_admin,
            is_asc: is_asc_authorized(user),
            is_coe: is_coe_authorized(user),
            is_director: is_director(user),
            is_scheduler: is_scheduler(user),
            can_access_advising_data: can_access_advising_data(user),
            departments: user
                .departments
                .iter()
                .map(|m| DepartmentProfile {
                    code: m.dept_code.clone(),
                    name: dept_name(&m.dept_code),
                    role: m.role,
                    is_drop_in_advisor: m.is_drop_in_advisor,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::user::{DeptMembership, NewUser};

    #[test]
    fn test_profile_flags_and_departments() {
        let user = NewUser::new("1133399", "Roberta Joan Anderson")
            .with_membership(DeptMembership::new("COENG", DeptRole::Director).drop_in())
            .into_user(3, Utc::now());
        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();

        assert_eq!(json["isCoe"], true);
        assert_eq!(json["isAsc"], false);
        assert_eq!(json["isDirector"], true);
        assert_eq!(json["canAccessAdvisingData"], true);
        assert_eq!(json["departments"][0]["name"], "College of Engineering");
        assert_eq!(json["departments"][0]["role"], "director");
        assert_eq!(json["departments"][0]["isDropInAdvisor"], true);
    }
}
