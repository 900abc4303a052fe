mod cohort;
mod curated;
mod params;

pub use cohort::{CohortView, CohortsByOwner, OwnerView};
pub use curated::{CuratedGroupView, CuratedGroupsByOwner};
pub use params::{parse_order, IncludeDeletedParams, StudentListParams};
