//! Curated groups: hand-maintained, ordered lists of students.

mod export;
mod requests;
mod types;

pub use export::{csv_filename, students_csv, CsvColumn, DownloadCsvRequest};
pub use requests::{AddStudentsRequest, CreateCuratedGroupRequest, RenameCuratedGroupRequest};
pub use types::{CuratedGroup, CuratedGroupError, NewCuratedGroup};
