use thiserror::Error;

/// Errors raised while parsing or validating cohort filter criteria.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("Unrecognized filter key: {0}")]
    UnknownKey(String),
    #[error("Invalid value for filter '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("Invalid numeric range: {0}")]
    InvalidRange(String),
    #[error("Filter criteria are required")]
    Empty,
    #[error("Unrecognized sort order: {0}")]
    InvalidOrderBy(String),
    /// The caller's departments do not grant use of this key.
    #[error("Unauthorized use of filter '{key}'")]
    Restricted { key: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_error_display() {
        assert_eq!(
            CriteriaError::UnknownKey("favoriteColor".into()).to_string(),
            "Unrecognized filter key: favoriteColor"
        );
        assert_eq!(
            CriteriaError::Restricted { key: "groupCodes" }.to_string(),
            "Unauthorized use of filter 'groupCodes'"
        );
    }
}
