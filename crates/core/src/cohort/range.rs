//! Numeric ranges in the `numrange(lo, hi, '[)')` notation used by saved
//! cohort criteria.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::CriteriaError;

#[derive(Debug, Clone, PartialEq)]
pub struct NumericRange {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub lower_inclusive: bool,
    pub upper_inclusive: bool,
    raw: String,
}

impl NumericRange {
    pub fn parse(input: &str) -> Result<Self, CriteriaError> {
        let invalid = || CriteriaError::InvalidRange(input.to_string());
        let trimmed = input.trim();
        let inner = trimmed
            .strip_prefix("numrange(")
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(invalid)?;

        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        let (lower, upper, bounds) = match parts.as_slice() {
            [lower, upper] => (*lower, *upper, "[)"),
            [lower, upper, bounds] => (*lower, *upper, bounds.trim_matches('\'')),
            _ => return Err(invalid()),
        };

        let lower_inclusive = match bounds.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(invalid()),
        };
        let upper_inclusive = match bounds.chars().nth(1) {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid()),
        };

        let range = Self {
            lower: parse_bound(lower).ok_or_else(invalid)?,
            upper: parse_bound(upper).ok_or_else(invalid)?,
            lower_inclusive,
            upper_inclusive,
            raw: trimmed.to_string(),
        };
        if let (Some(lo), Some(hi)) = (range.lower, range.upper) {
            if lo > hi {
                return Err(invalid());
            }
        }
        Ok(range)
    }

    pub fn contains(&self, value: f64) -> bool {
        let above = match self.lower {
            Some(lo) if self.lower_inclusive => value >= lo,
            Some(lo) => value > lo,
            None => true,
        };
        let below = match self.upper {
            Some(hi) if self.upper_inclusive => value <= hi,
            Some(hi) => value < hi,
            None => true,
        };
        above && below
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// `Some(None)` for an open bound, `None` when the bound is not a finite number.
fn parse_bound(s: &str) -> Option<Option<f64>> {
    if s.eq_ignore_ascii_case("null") || s.is_empty() {
        return Some(None);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some)
}

impl Serialize for NumericRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for NumericRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NumericRange::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_range() {
        let range = NumericRange::parse("numrange(0, 2, '[)')").unwrap();
        assert!(range.contains(0.0));
        assert!(range.contains(1.99));
        assert!(!range.contains(2.0));
    }

    #[test]
    fn test_unbounded_upper() {
        let range = NumericRange::parse("numrange(120, NULL, '[)')").unwrap();
        assert!(range.contains(120.0));
        assert!(range.contains(500.0));
        assert!(!range.contains(119.5));
    }

    #[test]
    fn test_closed_range_and_default_bounds() {
        let closed = NumericRange::parse("numrange(3.5, 4, '[]')").unwrap();
        assert!(closed.contains(4.0));

        let default = NumericRange::parse("numrange(3.5, 4)").unwrap();
        assert!(!default.contains(4.0));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(NumericRange::parse("0-2").is_err());
        assert!(NumericRange::parse("numrange(a, 2, '[)')").is_err());
        assert!(NumericRange::parse("numrange(3, 2, '[)')").is_err());
        assert!(NumericRange::parse("numrange(0, 2, '<>')").is_err());
    }

    #[test]
    fn test_non_finite_bounds_are_invalid() {
        for input in [
            "numrange(NaN, 2, '[)')",
            "numrange(0, inf, '[)')",
            "numrange(-inf, 2, '[)')",
            "numrange(0, infinity)",
        ] {
            assert_eq!(
                NumericRange::parse(input),
                Err(CriteriaError::InvalidRange(input.to_string())),
                "{input}"
            );
        }
    }

    #[test]
    fn test_serializes_as_original_string() {
        let range = NumericRange::parse("numrange(0, 2, '[)')").unwrap();
        assert_eq!(
            serde_json::to_value(&range).unwrap(),
            serde_json::json!("numrange(0, 2, '[)')")
        );
    }
}
