//! Maps legacy front-end paths to their replacements.
//!
//! Each mapping pairs a path pattern with a target path in which `\1`..`\9`
//! stand for the pattern's capture groups. Mappings are tried in order.

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RedirectError {
    #[error("Invalid path mappings: {0}")]
    InvalidJson(String),
    #[error("Invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[derive(Debug, Clone)]
struct PathMapping {
    pattern: Regex,
    target: String,
}

impl PathMapping {
    /// Part of the target before the first capture reference.
    fn target_prefix(&self) -> &str {
        self.target.split("\\1").next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct VueRedirects {
    mappings: Vec<PathMapping>,
}

impl VueRedirects {
    pub fn new<P, T>(pairs: impl IntoIterator<Item = (P, T)>) -> Result<Self, RedirectError>
    where
        P: AsRef<str>,
        T: Into<String>,
    {
        let mappings = pairs
            .into_iter()
            .map(|(pattern, target)| {
                let pattern = pattern.as_ref();
                Regex::new(&format!("^(?:{pattern})"))
                    .map(|regex| PathMapping {
                        pattern: regex,
                        target: target.into(),
                    })
                    .map_err(|e| RedirectError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { mappings })
    }

    /// Parses a JSON array of `[pattern, target]` pairs.
    pub fn from_json(json: &str) -> Result<Self, RedirectError> {
        let pairs: Vec<(String, String)> =
            serde_json::from_str(json).map_err(|e| RedirectError::InvalidJson(e.to_string()))?;
        Self::new(pairs)
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Where a front-end request should be sent, if anywhere.
    ///
    /// A matching pattern yields its target with captures substituted and
    /// the query string appended. A path that already lives under a
    /// target's prefix passes through unchanged.
    pub fn resolve(&self, path: &str, query: Option<&str>) -> Option<String> {
        let with_query = |p: String| match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{p}?{q}"),
            None => p,
        };

        for mapping in &self.mappings {
            if let Some(captures) = mapping.pattern.captures(path) {
                let mut target = mapping.target.clone();
                for (index, group) in captures.iter().skip(1).enumerate().take(9) {
                    let token = group.map(|m| m.as_str()).unwrap_or_default();
                    target = target.replace(&format!("\\{}", index + 1), token);
                }
                return Some(with_query(target));
            }
            if path.starts_with(mapping.target_prefix()) {
                return Some(with_query(path.to_string()));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirects() -> VueRedirects {
        VueRedirects::from_json(
            r#"[
                ["/student/(\\w+)", "/vue/student/\\1"],
                ["/cohort/filtered", "/vue/cohort"]
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_capture_substitution_keeps_query() {
        assert_eq!(
            redirects().resolve("/student/61889", Some("r=1")),
            Some("/vue/student/61889?r=1".to_string())
        );
    }

    #[test]
    fn test_target_prefix_passes_through() {
        assert_eq!(
            redirects().resolve("/vue/student/61889", None),
            Some("/vue/student/61889".to_string())
        );
    }

    #[test]
    fn test_unmatched_path() {
        let redirects = VueRedirects::new([("/student/(\\w+)", "/vue/student/\\1")]).unwrap();
        assert_eq!(redirects.resolve("/home", None), None);
    }

    #[test]
    fn test_pattern_anchored_at_start() {
        let redirects = VueRedirects::new([("/cohort", "/vue/cohort")]).unwrap();
        assert_eq!(
            redirects.resolve("/cohort/filtered", Some("")),
            Some("/vue/cohort".to_string())
        );
        assert_eq!(redirects.resolve("/x/cohort", None), None);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            VueRedirects::from_json("{"),
            Err(RedirectError::InvalidJson(_))
        ));
        assert!(matches!(
            VueRedirects::new([("(", "/vue")]),
            Err(RedirectError::InvalidPattern { .. })
        ));
    }
}
