use serde::{Deserialize, Serialize};

use super::term::term_name_for_id;

/// An athletic team group, e.g. "Football, Defensive Backs".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamGroup {
    pub group_code: String,
    pub group_name: String,
    pub team_code: String,
    pub team_name: String,
}

impl TeamGroup {
    pub fn new(group_code: &str, group_name: &str, team_code: &str, team_name: &str) -> Self {
        Self {
            group_code: group_code.to_string(),
            group_name: group_name.to_string(),
            team_code: team_code.to_string(),
            team_name: team_name.to_string(),
        }
    }
}

/// College of Engineering advising data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoeProfile {
    pub advisor_uid: String,
    pub probation: bool,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub underrepresented: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub sid: String,
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub gpa: Option<f64>,
    pub level: Option<String>,
    pub units: f64,
    pub majors: Vec<String>,
    pub expected_grad_term: Option<String>,
    pub transfer: bool,
    pub athletics: Vec<TeamGroup>,
    pub in_intensive_cohort: bool,
    pub is_active_asc: bool,
    pub status_asc: Option<String>,
    pub coe: Option<CoeProfile>,
}

impl Student {
    pub fn new(sid: &str, uid: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            sid: sid.to_string(),
            uid: uid.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            gpa: None,
            level: None,
            units: 0.0,
            majors: Vec::new(),
            expected_grad_term: None,
            transfer: false,
            athletics: Vec::new(),
            in_intensive_cohort: false,
            is_active_asc: true,
            status_asc: None,
            coe: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_athlete(&self) -> bool {
        !self.athletics.is_empty()
    }

    /// Lowest team group name, used for ordering by group.
    pub fn first_group_name(&self) -> Option<String> {
        self.athletics
            .iter()
            .map(|g| g.group_name.to_ascii_lowercase())
            .min()
    }

    /// Lowest major, used for ordering by major.
    pub fn first_major(&self) -> Option<String> {
        self.majors.iter().map(|m| m.to_ascii_lowercase()).min()
    }
}

/// Sort rank for class levels. Unknown levels sort after all known ones.
pub fn level_rank(level: Option<&str>) -> u8 {
    match level {
        Some("Freshman") => 1,
        Some("Sophomore") => 2,
        Some("Junior") => 3,
        Some("Senior") => 4,
        Some("Graduate") => 5,
        _ => 9,
    }
}

/// Which restricted parts of a profile the viewer may see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudentVisibility {
    pub athletics: bool,
    pub coe: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TermView {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AthleticsProfile {
    pub athletics: Vec<TeamGroup>,
    pub in_intensive_cohort: bool,
    pub is_active_asc: bool,
    pub status_asc: Option<String>,
}

/// Student profile as returned to API clients.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub sid: String,
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    #[serde(rename = "cumulativeGPA")]
    pub cumulative_gpa: Option<f64>,
    pub cumulative_units: f64,
    pub level: Option<String>,
    pub majors: Vec<String>,
    pub expected_graduation_term: Option<TermView>,
    pub transfer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub athletics_profile: Option<AthleticsProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coe_profile: Option<CoeProfile>,
}

impl StudentProfile {
    pub fn from_student(student: &Student, visibility: StudentVisibility) -> Self {
        let athletics_profile = (visibility.athletics && student.is_athlete()).then(|| {
            let mut athletics = student.athletics.clone();
            athletics.sort_by(|a, b| a.group_name.cmp(&b.group_name));
            AthleticsProfile {
                athletics,
                in_intensive_cohort: student.in_intensive_cohort,
                is_active_asc: student.is_active_asc,
                status_asc: student.status_asc.clone(),
            }
        });
        let coe_profile = if visibility.coe {
            student.coe.clone()
        } else {
            None
        };

        Self {
            sid: student.sid.clone(),
            uid: student.uid.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            name: student.full_name(),
            cumulative_gpa: student.gpa,
            cumulative_units: student.units,
            level: student.level.clone(),
            majors: student.majors.clone(),
            expected_graduation_term: student.expected_grad_term.as_ref().map(|id| TermView {
                id: id.clone(),
                name: term_name_for_id(id),
            }),
            transfer: student.transfer,
            athletics_profile,
            coe_profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn athlete() -> Student {
        let mut student = Student::new("3456789012", "242881", "Paul", "Kerschen");
        student.athletics = vec![
            TeamGroup::new("MTE", "Men's Tennis", "TNM", "Men's Tennis"),
            TeamGroup::new("MFB-DL", "Football, Defensive Line", "FBM", "Football"),
        ];
        student.majors = vec!["Political Economy BA".into(), "English BA".into()];
        student.expected_grad_term = Some("2198".into());
        student.coe = Some(CoeProfile {
            advisor_uid: "1133399".into(),
            probation: false,
            gender: Some("M".into()),
            ethnicity: None,
            underrepresented: false,
        });
        student
    }

    #[test]
    fn test_first_group_name_and_major() {
        let student = athlete();
        assert_eq!(
            student.first_group_name().as_deref(),
            Some("football, defensive line")
        );
        assert_eq!(student.first_major().as_deref(), Some("english ba"));
    }

    #[test]
    fn test_level_rank_orders_class_years() {
        assert!(level_rank(Some("Freshman")) < level_rank(Some("Senior")));
        assert!(level_rank(Some("Graduate")) < level_rank(None));
    }

    #[test]
    fn test_profile_hides_restricted_fields() {
        let profile = StudentProfile::from_student(&athlete(), StudentVisibility::default());
        let json = serde_json::to_value(&profile).unwrap();

        assert!(json.get("athleticsProfile").is_none());
        assert!(json.get("coeProfile").is_none());
        assert_eq!(json["expectedGraduationTerm"]["name"], "Fall 2019");
        assert_eq!(json["name"], "Paul Kerschen");
    }

    #[test]
    fn test_profile_shows_sorted_athletics_to_asc() {
        let profile = StudentProfile::from_student(
            &athlete(),
            StudentVisibility {
                athletics: true,
                coe: true,
            },
        );
        let athletics = profile.athletics_profile.unwrap();

        assert_eq!(athletics.athletics[0].group_code, "MFB-DL");
        assert!(athletics.is_active_asc);
        assert_eq!(profile.coe_profile.unwrap().advisor_uid, "1133399");
    }
}
