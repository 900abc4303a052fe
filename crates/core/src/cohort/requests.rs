//! Request payloads for cohort creation, update and ad-hoc evaluation.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::serde::deserialize_optional_string;

use super::{CriteriaError, FilterCriteria, FilterEntry};

/// Criteria supplied in any of the accepted forms: a `filters` list, a
/// `criteria` object, or (deprecated) criteria keys at the top level.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CriteriaInput {
    pub filters: Option<Vec<FilterEntry>>,
    pub criteria: Option<Map<String, Value>>,
    /// Every remaining top-level key.
    #[serde(flatten)]
    pub legacy: Map<String, Value>,
}

impl CriteriaInput {
    /// Resolves the criteria, preferring `filters` over `criteria` over the
    /// top-level keys. `None` when no form carries a constraint.
    ///
    /// Unrecognized top-level keys are rejected whichever form is used.
    pub fn resolve(&self) -> Result<Option<FilterCriteria>, CriteriaError> {
        let legacy = FilterCriteria::from_object(&self.legacy)?;
        let criteria = if let Some(filters) = &self.filters {
            FilterCriteria::from_filters(filters)?
        } else if let Some(criteria) = &self.criteria {
            FilterCriteria::from_object(criteria)?
        } else {
            legacy
        };
        Ok((!criteria.is_empty()).then_some(criteria))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCohortRequest {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub input: CriteriaInput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCohortRequest {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub input: CriteriaInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentsPerFiltersRequest {
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub order_by: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filters_take_precedence() {
        let request: CreateCohortRequest = serde_json::from_value(json!({
            "name": "Tennis",
            "filters": [{"key": "groupCodes", "type": "array", "value": "MTE"}],
            "levels": ["Senior"],
        }))
        .unwrap();

        let criteria = request.input.resolve().unwrap().unwrap();
        assert_eq!(criteria.group_codes, Some(vec!["MTE".to_string()]));
        assert_eq!(criteria.levels, None);
    }

    #[test]
    fn test_legacy_top_level_keys() {
        let request: CreateCohortRequest = serde_json::from_value(json!({
            "name": "Low GPA",
            "gpaRanges": ["numrange(0, 2, '[)')"],
        }))
        .unwrap();

        assert_eq!(request.name.as_deref(), Some("Low GPA"));
        let criteria = request.input.resolve().unwrap().unwrap();
        assert_eq!(criteria.gpa_ranges.map(|r| r.len()), Some(1));
    }

    #[test]
    fn test_nothing_supplied_resolves_to_none() {
        let request: UpdateCohortRequest =
            serde_json::from_value(json!({"id": 7, "name": "  "})).unwrap();

        assert_eq!(request.name, None);
        assert_eq!(request.input.resolve().unwrap(), None);
    }

    #[test]
    fn test_invalid_criteria_object() {
        let request: UpdateCohortRequest = serde_json::from_value(json!({
            "id": 7,
            "criteria": {"lastNameRange": ["A"]},
        }))
        .unwrap();

        assert!(request.input.resolve().is_err());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let legacy: CreateCohortRequest = serde_json::from_value(json!({
            "name": "Juniors",
            "levels": ["Junior"],
            "favoriteColor": ["red"],
        }))
        .unwrap();
        assert_eq!(
            legacy.input.resolve(),
            Err(CriteriaError::UnknownKey("favoriteColor".to_string()))
        );

        let object: CreateCohortRequest = serde_json::from_value(json!({
            "name": "Juniors",
            "criteria": {"levels": ["Junior"], "favoriteColor": ["red"]},
        }))
        .unwrap();
        assert_eq!(
            object.input.resolve(),
            Err(CriteriaError::UnknownKey("favoriteColor".to_string()))
        );
    }

    #[test]
    fn test_malformed_criteria_value() {
        let request: CreateCohortRequest = serde_json::from_value(json!({
            "name": "X",
            "criteria": {"gpaRanges": ["bogus"]},
        }))
        .unwrap();

        assert!(matches!(
            request.input.resolve(),
            Err(CriteriaError::InvalidValue { .. })
        ));
    }
}
