mod authz;
mod profile;
mod types;

pub use authz::{
    can_access_advising_data, can_use_private_notes, can_view_cohort, is_admin, is_advisor,
    is_asc_authorized, is_coe_authorized, is_director, is_drop_in_authorized, is_scheduler,
    shares_department,
};
pub use profile::{DepartmentProfile, UserProfile};
pub use types::{
    dept_name, AuthorizedUser, DeptMembership, DeptRole, NewUser, ASC_DEPT_CODE, CE3_DEPT_CODE,
    COE_DEPT_CODE,
};
