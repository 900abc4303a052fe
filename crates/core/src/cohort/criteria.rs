//! Cohort filter criteria.
//!
//! Criteria arrive either as a list of `{key, type, value}` filter entries or
//! as a criteria object keyed by filter name. Both normalize to
//! [`FilterCriteria`], which serializes every known key (unset keys as
//! `null`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CriteriaError, NumericRange};

/// Keys that expose athlete-only data.
pub const ASC_KEYS: &[&str] = &["groupCodes", "inIntensiveCohort", "isInactiveAsc"];
/// Keys that expose College of Engineering data.
pub const COE_KEYS: &[&str] = &[
    "advisorLdapUids",
    "coeProbation",
    "ethnicities",
    "genders",
    "underrepresented",
];

/// Every key a criteria object may carry.
pub const CRITERIA_KEYS: &[&str] = &[
    "advisorLdapUids",
    "coeProbation",
    "ethnicities",
    "expectedGradTerms",
    "genders",
    "gpaRanges",
    "groupCodes",
    "inIntensiveCohort",
    "isInactiveAsc",
    "lastNameRange",
    "levels",
    "majors",
    "transfer",
    "underrepresented",
    "unitRanges",
];

/// Meta major matching every major that is not "undeclared".
pub const DECLARED_MAJOR: &str = "Declared";
/// Meta major matching every major containing "undeclared".
pub const UNDECLARED_MAJOR: &str = "Undeclared";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Array,
    Boolean,
    Range,
}

/// One entry of the `filters` list sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    #[serde(default)]
    pub value: Value,
}

impl FilterEntry {
    pub fn array(key: &str, value: impl Into<Value>) -> Self {
        Self {
            key: key.to_string(),
            filter_type: FilterType::Array,
            value: value.into(),
        }
    }

    pub fn boolean(key: &str, value: bool) -> Self {
        Self {
            key: key.to_string(),
            filter_type: FilterType::Boolean,
            value: Value::Bool(value),
        }
    }

    pub fn range(key: &str, start: &str, end: &str) -> Self {
        Self {
            key: key.to_string(),
            filter_type: FilterType::Range,
            value: Value::from(vec![start, end]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub advisor_ldap_uids: Option<Vec<String>>,
    pub coe_probation: Option<bool>,
    pub ethnicities: Option<Vec<String>>,
    pub expected_grad_terms: Option<Vec<String>>,
    pub genders: Option<Vec<String>>,
    pub gpa_ranges: Option<Vec<NumericRange>>,
    pub group_codes: Option<Vec<String>>,
    pub in_intensive_cohort: Option<bool>,
    pub is_inactive_asc: Option<bool>,
    pub last_name_range: Option<Vec<String>>,
    pub levels: Option<Vec<String>>,
    pub majors: Option<Vec<String>>,
    pub transfer: Option<bool>,
    pub underrepresented: Option<bool>,
    pub unit_ranges: Option<Vec<NumericRange>>,
}

impl FilterCriteria {
    /// Builds criteria from a list of filter entries.
    pub fn from_filters(filters: &[FilterEntry]) -> Result<Self, CriteriaError> {
        let mut criteria = Self::default();
        for entry in filters {
            criteria.apply(entry)?;
        }
        criteria.validate()?;
        Ok(criteria)
    }

    /// Builds criteria from an object keyed by filter name. Keys outside
    /// [`CRITERIA_KEYS`] are rejected.
    pub fn from_object(object: &Map<String, Value>) -> Result<Self, CriteriaError> {
        if let Some(key) = object.keys().find(|k| !CRITERIA_KEYS.contains(&k.as_str())) {
            return Err(CriteriaError::UnknownKey(key.clone()));
        }
        let criteria: Self = serde_json::from_value(Value::Object(object.clone()))
            .map_err(|e| invalid("criteria", &e.to_string()))?;
        criteria.validate()?;
        Ok(criteria)
    }

    fn apply(&mut self, entry: &FilterEntry) -> Result<(), CriteriaError> {
        let key = entry.key.as_str();
        let expected = match key {
            "advisorLdapUids" | "ethnicities" | "expectedGradTerms" | "genders" | "gpaRanges"
            | "groupCodes" | "levels" | "majors" | "unitRanges" => FilterType::Array,
            "coeProbation" | "inIntensiveCohort" | "isInactiveAsc" | "transfer"
            | "underrepresented" => FilterType::Boolean,
            "lastNameRange" => FilterType::Range,
            _ => return Err(CriteriaError::UnknownKey(entry.key.clone())),
        };
        if entry.filter_type != expected {
            return Err(invalid(key, "filter type does not match key"));
        }

        match key {
            "advisorLdapUids" => {
                push_all(&mut self.advisor_ldap_uids, strings(key, &entry.value)?)
            }
            "ethnicities" => push_all(&mut self.ethnicities, strings(key, &entry.value)?),
            "expectedGradTerms" => {
                push_all(&mut self.expected_grad_terms, strings(key, &entry.value)?)
            }
            "genders" => push_all(&mut self.genders, strings(key, &entry.value)?),
            "groupCodes" => push_all(&mut self.group_codes, strings(key, &entry.value)?),
            "levels" => push_all(&mut self.levels, strings(key, &entry.value)?),
            "majors" => push_all(&mut self.majors, strings(key, &entry.value)?),
            "gpaRanges" => push_all(&mut self.gpa_ranges, ranges(key, &entry.value)?),
            "unitRanges" => push_all(&mut self.unit_ranges, ranges(key, &entry.value)?),
            "coeProbation" => self.coe_probation = Some(boolean(key, &entry.value)?),
            "inIntensiveCohort" => self.in_intensive_cohort = Some(boolean(key, &entry.value)?),
            "isInactiveAsc" => self.is_inactive_asc = Some(boolean(key, &entry.value)?),
            "transfer" => self.transfer = Some(boolean(key, &entry.value)?),
            "underrepresented" => self.underrepresented = Some(boolean(key, &entry.value)?),
            _ => self.last_name_range = Some(strings(key, &entry.value)?),
        }
        Ok(())
    }

    /// Structural checks shared by both input forms.
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if let Some(range) = &self.last_name_range {
            let valid = range.len() == 2 && range.iter().all(|s| !s.trim().is_empty());
            if !valid {
                return Err(invalid(
                    "lastNameRange",
                    "expected two non-empty bounds, e.g. [\"A\", \"M\"]",
                ));
            }
        }
        Ok(())
    }

    /// True when no key constrains the population.
    pub fn is_empty(&self) -> bool {
        self.used_keys().is_empty()
    }

    /// Names of the keys that carry a constraint.
    pub fn used_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        let mut list = |name: &'static str, set: bool| {
            if set {
                keys.push(name);
            }
        };
        list("advisorLdapUids", non_empty(&self.advisor_ldap_uids));
        list("coeProbation", self.coe_probation.is_some());
        list("ethnicities", non_empty(&self.ethnicities));
        list("expectedGradTerms", non_empty(&self.expected_grad_terms));
        list("genders", non_empty(&self.genders));
        list("gpaRanges", non_empty(&self.gpa_ranges));
        list("groupCodes", non_empty(&self.group_codes));
        list("inIntensiveCohort", self.in_intensive_cohort.is_some());
        list("isInactiveAsc", self.is_inactive_asc.is_some());
        list("lastNameRange", self.last_name_range.is_some());
        list("levels", non_empty(&self.levels));
        list("majors", non_empty(&self.majors));
        list("transfer", self.transfer.is_some());
        list("underrepresented", self.underrepresented.is_some());
        list("unitRanges", non_empty(&self.unit_ranges));
        keys
    }

    /// Rejects keys the caller's departments do not unlock.
    pub fn check_access(
        &self,
        asc_authorized: bool,
        coe_authorized: bool,
    ) -> Result<(), CriteriaError> {
        for key in self.used_keys() {
            let denied = (!asc_authorized && ASC_KEYS.contains(&key))
                || (!coe_authorized && COE_KEYS.contains(&key));
            if denied {
                return Err(CriteriaError::Restricted { key });
            }
        }
        Ok(())
    }
}

pub(crate) fn non_empty<T>(values: &Option<Vec<T>>) -> bool {
    values.as_ref().is_some_and(|v| !v.is_empty())
}

fn invalid(key: &str, reason: &str) -> CriteriaError {
    CriteriaError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn push_all<T>(target: &mut Option<Vec<T>>, values: Vec<T>) {
    target.get_or_insert_with(Vec::new).extend(values);
}

fn strings(key: &str, value: &Value) -> Result<Vec<String>, CriteriaError> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(invalid(key, "expected a string")),
            })
            .collect(),
        Value::Number(n) => Ok(vec![n.to_string()]),
        _ => Err(invalid(key, "expected a string or list of strings")),
    }
}

fn ranges(key: &str, value: &Value) -> Result<Vec<NumericRange>, CriteriaError> {
    strings(key, value)?
        .iter()
        .map(|s| NumericRange::parse(s))
        .collect()
}

fn boolean(key: &str, value: &Value) -> Result<bool, CriteriaError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(invalid(key, "expected a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_filters_accumulate() {
        let criteria = FilterCriteria::from_filters(&[
            FilterEntry::array("groupCodes", "MFB-DB"),
            FilterEntry::array("groupCodes", "MFB-DL"),
            FilterEntry::array("gpaRanges", "numrange(0, 2, '[)')"),
        ])
        .unwrap();

        assert_eq!(
            criteria.group_codes,
            Some(vec!["MFB-DB".to_string(), "MFB-DL".to_string()])
        );
        assert_eq!(criteria.gpa_ranges.as_ref().map(Vec::len), Some(1));
        assert_eq!(criteria.used_keys(), vec!["gpaRanges", "groupCodes"]);
    }

    #[test]
    fn test_boolean_and_range_filters() {
        let criteria = FilterCriteria::from_filters(&[
            FilterEntry::boolean("isInactiveAsc", false),
            FilterEntry::range("lastNameRange", "A", "M"),
        ])
        .unwrap();

        assert_eq!(criteria.is_inactive_asc, Some(false));
        assert_eq!(
            criteria.last_name_range,
            Some(vec!["A".to_string(), "M".to_string()])
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = FilterCriteria::from_filters(&[FilterEntry::array("favoriteColor", "red")])
            .unwrap_err();
        assert_eq!(err, CriteriaError::UnknownKey("favoriteColor".into()));
    }

    #[test]
    fn test_mismatched_type_rejected() {
        let entry = FilterEntry {
            key: "majors".into(),
            filter_type: FilterType::Boolean,
            value: Value::Bool(true),
        };
        assert!(matches!(
            FilterCriteria::from_filters(&[entry]),
            Err(CriteriaError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_bad_range_rejected() {
        let err = FilterCriteria::from_filters(&[FilterEntry::array("unitRanges", "lots")])
            .unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidRange(_)));
    }

    #[test]
    fn test_serializes_unset_keys_as_null() {
        let criteria = FilterCriteria {
            majors: Some(vec!["Undeclared".into()]),
            ..Default::default()
        };
        let json = serde_json::to_value(&criteria).unwrap();

        assert_eq!(json["majors"], serde_json::json!(["Undeclared"]));
        assert!(json["groupCodes"].is_null());
        assert!(json.as_object().unwrap().contains_key("lastNameRange"));
        assert_eq!(json.as_object().unwrap().len(), 15);
    }

    #[test]
    fn test_criteria_object_form_deserializes() {
        let criteria: FilterCriteria = serde_json::from_value(serde_json::json!({
            "gpaRanges": ["numrange(0, 2, '[)')"],
            "isInactiveAsc": true,
        }))
        .unwrap();

        assert_eq!(criteria.is_inactive_asc, Some(true));
        assert!(!criteria.is_empty());
    }

    #[test]
    fn test_check_access() {
        let asc = FilterCriteria {
            group_codes: Some(vec!["MFB-DB".into()]),
            ..Default::default()
        };
        let coe = FilterCriteria {
            advisor_ldap_uids: Some(vec!["1133399".into()]),
            ..Default::default()
        };

        assert_eq!(
            asc.check_access(false, true),
            Err(CriteriaError::Restricted { key: "groupCodes" })
        );
        assert!(asc.check_access(true, false).is_ok());
        assert_eq!(
            coe.check_access(true, false),
            Err(CriteriaError::Restricted {
                key: "advisorLdapUids"
            })
        );
    }

    #[test]
    fn test_empty_lists_do_not_count() {
        let criteria = FilterCriteria {
            levels: Some(vec![]),
            ..Default::default()
        };
        assert!(criteria.is_empty());
    }
}
