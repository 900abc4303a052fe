//! Pure authorization predicates over [`AuthorizedUser`].
//!
//! Handlers combine these into request guards; nothing here knows about HTTP.

use super::{AuthorizedUser, DeptRole, ASC_DEPT_CODE, CE3_DEPT_CODE, COE_DEPT_CODE};

pub fn is_admin(user: &AuthorizedUser) -> bool {
    user.is_admin
}

pub fn can_access_advising_data(user: &AuthorizedUser) -> bool {
    user.is_admin || user.can_access_advising_data
}

/// Admins, and anyone advising or directing in some department.
pub fn is_advisor(user: &AuthorizedUser) -> bool {
    user.is_admin
        || user
            .departments
            .iter()
            .any(|m| matches!(m.role, DeptRole::Advisor | DeptRole::Director))
}

pub fn is_director(user: &AuthorizedUser) -> bool {
    user.departments.iter().any(|m| m.role == DeptRole::Director)
}

pub fn is_scheduler(user: &AuthorizedUser) -> bool {
    user.departments
        .iter()
        .any(|m| m.role == DeptRole::Scheduler)
}

pub fn is_asc_authorized(user: &AuthorizedUser) -> bool {
    user.is_admin || user.is_member_of(ASC_DEPT_CODE)
}

pub fn is_coe_authorized(user: &AuthorizedUser) -> bool {
    user.is_admin || user.is_member_of(COE_DEPT_CODE)
}

/// Only CE3 advisors may write or read private notes. Admin status does not
/// grant this.
pub fn can_use_private_notes(user: &AuthorizedUser) -> bool {
    user.is_member_of(CE3_DEPT_CODE)
}

/// Drop-in workflows are available to admins and to schedulers or drop-in
/// advisors of a department that supports drop-ins.
pub fn is_drop_in_authorized(user: &AuthorizedUser, drop_in_depts: &[String]) -> bool {
    if user.is_admin {
        return true;
    }
    user.departments.iter().any(|m| {
        let supported = drop_in_depts
            .iter()
            .any(|d| d.eq_ignore_ascii_case(&m.dept_code));
        supported && (m.role == DeptRole::Scheduler || m.is_drop_in_advisor)
    })
}

pub fn shares_department(a: &AuthorizedUser, b: &AuthorizedUser) -> bool {
    a.departments.iter().any(|m| b.is_member_of(&m.dept_code))
}

/// Whether `viewer` may see a cohort owned by `owner`.
pub fn can_view_cohort(viewer: &AuthorizedUser, owner: &AuthorizedUser) -> bool {
    viewer.is_admin || viewer.uid == owner.uid || shares_department(viewer, owner)
}
