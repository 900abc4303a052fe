//! CSV export of a curated group's students.

use serde::Deserialize;

use crate::student::{term_name_for_id, Student};

use super::CuratedGroupError;

/// A column the caller may select for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvColumn {
    FirstName,
    LastName,
    Sid,
    Majors,
    Level,
    ExpectedGraduationTerm,
    UnitsCompleted,
    CumulativeGpa,
}

impl CsvColumn {
    pub fn header(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Sid => "sid",
            Self::Majors => "majors",
            Self::Level => "level",
            Self::ExpectedGraduationTerm => "expected_graduation_term",
            Self::UnitsCompleted => "units_completed",
            Self::CumulativeGpa => "cumulative_gpa",
        }
    }

    fn value(self, student: &Student) -> String {
        match self {
            Self::FirstName => student.first_name.clone(),
            Self::LastName => student.last_name.clone(),
            Self::Sid => student.sid.clone(),
            Self::Majors => student.majors.join(";"),
            Self::Level => student.level.clone().unwrap_or_default(),
            Self::ExpectedGraduationTerm => student
                .expected_grad_term
                .as_deref()
                .and_then(term_name_for_id)
                .unwrap_or_default(),
            Self::UnitsCompleted => student.units.to_string(),
            Self::CumulativeGpa => student.gpa.map(|g| g.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadCsvRequest {
    #[serde(default)]
    pub csv_columns_selected: Vec<CsvColumn>,
}

impl DownloadCsvRequest {
    pub fn columns(&self) -> Result<&[CsvColumn], CuratedGroupError> {
        if self.csv_columns_selected.is_empty() {
            Err(CuratedGroupError::NoCsvColumns)
        } else {
            Ok(&self.csv_columns_selected)
        }
    }
}

/// Header row plus one row per student, in the given order.
pub fn students_csv(columns: &[CsvColumn], students: &[Student]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(|c| c.header()))?;
    for student in students {
        writer.write_record(columns.iter().map(|c| c.value(student)))?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// `{group name}-students-{YYYY-MM-DD_HH-MM-SS}.csv`
pub fn csv_filename(group_name: &str, now: chrono::NaiveDateTime) -> String {
    format!("{group_name}-students-{}.csv", now.format("%Y-%m-%d_%H-%M-%S"))
}
