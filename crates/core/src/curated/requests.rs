use serde::Deserialize;

use crate::serde::{deserialize_form_bool, deserialize_optional_string, deserialize_string_list};

use super::CuratedGroupError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCuratedGroupRequest {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub sids: Vec<String>,
}

impl CreateCuratedGroupRequest {
    pub fn name(&self) -> Result<&str, CuratedGroupError> {
        self.name
            .as_deref()
            .map(str::trim)
            .ok_or(CuratedGroupError::NameRequired)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStudentsRequest {
    pub curated_group_id: i64,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub sids: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_form_bool")]
    pub return_student_profiles: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameCuratedGroupRequest {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub name: Option<String>,
}

impl RenameCuratedGroupRequest {
    pub fn name(&self) -> Result<&str, CuratedGroupError> {
        self.name
            .as_deref()
            .map(str::trim)
            .ok_or(CuratedGroupError::NameRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_requires_name() {
        let request: CreateCuratedGroupRequest =
            serde_json::from_value(json!({"name": " ", "sids": ["11667051"]})).unwrap();
        assert_eq!(request.name(), Err(CuratedGroupError::NameRequired));
    }

    #[test]
    fn test_add_students_request() {
        let request: AddStudentsRequest = serde_json::from_value(json!({
            "curatedGroupId": 3,
            "sids": ["11667051", "2345678901"],
            "returnStudentProfiles": true,
        }))
        .unwrap();

        assert_eq!(request.curated_group_id, 3);
        assert_eq!(request.sids.len(), 2);
        assert!(request.return_student_profiles);
    }
}
