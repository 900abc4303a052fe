mod sids;
mod term;
mod types;

pub use sids::dedupe_sids;
pub use term::term_name_for_id;
pub use types::{
    level_rank, AthleticsProfile, CoeProfile, Student, StudentProfile, StudentVisibility,
    TeamGroup, TermView,
};
