//! Cohorts: saved filters over the student population and the query
//! builder that evaluates them.

mod criteria;
mod error;
mod query;
mod range;
mod requests;
pub mod sql;
mod types;

pub use criteria::{
    FilterCriteria, FilterEntry, FilterType, ASC_KEYS, COE_KEYS, DECLARED_MAJOR, UNDECLARED_MAJOR,
};
pub use error::CriteriaError;
pub use query::{OrderBy, PopulationScope, StudentPage, StudentQuery, DEFAULT_PAGE_LIMIT};
pub use range::NumericRange;
pub use requests::{
    CreateCohortRequest, CriteriaInput, StudentsPerFiltersRequest, UpdateCohortRequest,
};
pub use types::{CohortFilter, NewCohort};
