use serde::Deserialize;

use boac_core::cohort::{CriteriaError, OrderBy, DEFAULT_PAGE_LIMIT};
use boac_core::serde::{deserialize_form_bool, deserialize_optional_string};

/// Query parameters of student listings (`?orderBy&offset&limit&includeStudents`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub order_by: Option<String>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default = "include_students_default", deserialize_with = "deserialize_form_bool")]
    pub include_students: bool,
}

fn include_students_default() -> bool {
    true
}

impl Default for StudentListParams {
    fn default() -> Self {
        Self {
            order_by: None,
            offset: None,
            limit: None,
            include_students: true,
        }
    }
}

impl StudentListParams {
    pub fn order(&self) -> Result<OrderBy, CriteriaError> {
        parse_order(self.order_by.as_deref())
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }
}

/// Parses an optional sort key, defaulting to last name.
pub fn parse_order(order_by: Option<&str>) -> Result<OrderBy, CriteriaError> {
    order_by
        .map(str::parse)
        .transpose()
        .map(Option::unwrap_or_default)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeDeletedParams {
    #[serde(default, deserialize_with = "deserialize_form_bool")]
    pub include_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params: StudentListParams = serde_json::from_str("{}").unwrap();
        assert!(params.include_students);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(params.order().unwrap(), OrderBy::LastName);
    }

    #[test]
    fn test_order_aliases() {
        assert_eq!(parse_order(Some("firstName")).unwrap(), OrderBy::FirstName);
        assert_eq!(parse_order(Some("group_name")).unwrap(), OrderBy::GroupName);
        assert!(parse_order(Some("shoe_size")).is_err());
    }
}
